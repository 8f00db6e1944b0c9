//! Plain-text rendering of the turn event feed.
//!
//! Assistant text goes to stdout as it streams; status, tool and error
//! messages go to stderr on their own lines.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use crate::models::{Message, MessageRole};
use crate::turn::{TurnEvent, TurnEventKind};

/// Prints only what each assistant message gained since the last event.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    /// Bytes of each assistant message already printed
    printed: HashMap<usize, usize>,
    /// Status, tool and error messages already printed
    announced: HashSet<usize>,
    /// Assistant text was printed without a trailing newline
    mid_line: bool,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render<O, E>(&mut self, event: &TurnEvent, out: &mut O, err: &mut E) -> io::Result<()>
    where
        O: Write,
        E: Write,
    {
        match &event.kind {
            TurnEventKind::MessageAppended { index, message }
            | TurnEventKind::MessageUpdated { index, message } => {
                self.render_message(*index, message, out, err)
            }
            TurnEventKind::DocumentUpdated { content } => {
                self.break_line(out)?;
                writeln!(err, "[document updated: {} bytes]", content.len())
            }
            TurnEventKind::StatusChanged { .. } => Ok(()),
        }
    }

    /// End the current assistant line, if any.
    pub fn finish<O: Write>(&mut self, out: &mut O) -> io::Result<()> {
        self.break_line(out)?;
        out.flush()
    }

    fn render_message<O, E>(
        &mut self,
        index: usize,
        message: &Message,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<()>
    where
        O: Write,
        E: Write,
    {
        match message.role {
            MessageRole::Assistant => {
                let printed = self.printed.entry(index).or_insert(0);
                if let Some(fresh) = message.content.get(*printed..) {
                    if !fresh.is_empty() {
                        write!(out, "{}", fresh)?;
                        out.flush()?;
                        self.mid_line = true;
                    }
                }
                *printed = message.content.len();
                // Attachments are listed once the message is closed
                if message.terminal {
                    for attachment in &message.attachments {
                        self.break_line(out)?;
                        writeln!(err, "[attachment] {} {}", attachment.name, attachment.url)?;
                    }
                }
                Ok(())
            }
            MessageRole::User => Ok(()),
            // A status may take over the index of a replaced placeholder
            role if self.announced.insert(index) => {
                self.printed.remove(&index);
                self.break_line(out)?;
                writeln!(err, "[{}] {}", role, message.content)
            }
            _ => Ok(()),
        }
    }

    fn break_line<O: Write>(&mut self, out: &mut O) -> io::Result<()> {
        if self.mid_line {
            writeln!(out)?;
            self.mid_line = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, StatusKind};

    fn event(kind: TurnEventKind) -> TurnEvent {
        TurnEvent::new("s", "t", kind)
    }

    fn updated(index: usize, content: &str) -> TurnEvent {
        event(TurnEventKind::MessageUpdated {
            index,
            message: Message::open_assistant(content),
        })
    }

    #[test]
    fn test_prints_only_new_text() {
        let mut renderer = TranscriptRenderer::new();
        let (mut out, mut err) = (Vec::new(), Vec::new());

        for content in ["안", "안녕", "안녕하세요"] {
            renderer.render(&updated(1, content), &mut out, &mut err).unwrap();
        }
        renderer.finish(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "안녕하세요\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_status_goes_to_stderr_on_own_line() {
        let mut renderer = TranscriptRenderer::new();
        let (mut out, mut err) = (Vec::new(), Vec::new());

        renderer.render(&updated(1, "Let me check"), &mut out, &mut err).unwrap();
        renderer
            .render(
                &event(TurnEventKind::MessageAppended {
                    index: 2,
                    message: Message::status(StatusKind::Tool, "Retrieving"),
                }),
                &mut out,
                &mut err,
            )
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Let me check\n");
        assert_eq!(String::from_utf8(err).unwrap(), "[tool] Retrieving\n");
    }

    #[test]
    fn test_status_replacing_placeholder_is_printed_once() {
        let mut renderer = TranscriptRenderer::new();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let status = || {
            event(TurnEventKind::MessageUpdated {
                index: 1,
                message: Message::status(StatusKind::Thinking, "분석 중"),
            })
        };

        renderer.render(&updated(1, ""), &mut out, &mut err).unwrap();
        renderer.render(&status(), &mut out, &mut err).unwrap();
        renderer.render(&status(), &mut out, &mut err).unwrap();

        assert!(out.is_empty());
        assert_eq!(String::from_utf8(err).unwrap(), "[status] 분석 중\n");
    }

    #[test]
    fn test_attachments_listed_when_closed() {
        let mut renderer = TranscriptRenderer::new();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let mut message = Message::open_assistant("here");
        message.attachments = vec![Attachment::new("a.pdf", "application/pdf", "https://f/a")];
        message.terminal = true;

        renderer
            .render(
                &event(TurnEventKind::MessageUpdated { index: 1, message }),
                &mut out,
                &mut err,
            )
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "here\n");
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "[attachment] a.pdf https://f/a\n"
        );
    }
}
