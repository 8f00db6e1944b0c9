//! Command-line argument parsing for the parlor CLI.

use std::path::PathBuf;

/// Arguments of a streamed prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct AskArgs {
    /// Session to continue; a fresh one is created when absent
    pub session_id: Option<String>,
    /// File answering tool calls and receiving document updates
    pub document: Option<PathBuf>,
    pub prompt: String,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Stream one turn
    Ask(AskArgs),
    /// Arguments could not be parsed
    Invalid(String),
}

pub const USAGE: &str = "Usage: parlor [--session ID] [--document PATH] [--version] PROMPT...";

/// Parse command-line arguments and return the command to run.
///
/// # Examples
///
/// ```
/// use parlor::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["parlor".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut session_id = None;
    let mut document = None;
    let mut words = Vec::new();

    // Skip the program name
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--session" | "-s" => match args.next() {
                Some(value) => session_id = Some(value),
                None => return CliCommand::Invalid("--session needs a value".to_string()),
            },
            "--document" | "-d" => match args.next() {
                Some(value) => document = Some(PathBuf::from(value)),
                None => return CliCommand::Invalid("--document needs a value".to_string()),
            },
            "--" => {
                words.extend(args.by_ref());
            }
            flag if flag.starts_with("--") => {
                return CliCommand::Invalid(format!("Unknown flag: {}", flag));
            }
            _ => words.push(arg),
        }
    }

    if words.is_empty() {
        return CliCommand::Help;
    }

    CliCommand::Ask(AskArgs {
        session_id,
        document,
        prompt: words.join(" "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliCommand {
        let mut all = vec!["parlor".to_string()];
        all.extend(args.iter().map(|a| a.to_string()));
        parse_args(all.into_iter())
    }

    #[test]
    fn test_parse_version_flag() {
        assert_eq!(parse(&["--version"]), CliCommand::Version);
        assert_eq!(parse(&["-V"]), CliCommand::Version);
    }

    #[test]
    fn test_parse_no_args_shows_help() {
        assert_eq!(parse(&[]), CliCommand::Help);
    }

    #[test]
    fn test_parse_prompt_words_joined() {
        assert_eq!(
            parse(&["summarize", "my", "notes"]),
            CliCommand::Ask(AskArgs {
                session_id: None,
                document: None,
                prompt: "summarize my notes".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_session_and_document() {
        assert_eq!(
            parse(&["--session", "abc", "-d", "notes.md", "fix", "typos"]),
            CliCommand::Ask(AskArgs {
                session_id: Some("abc".to_string()),
                document: Some(PathBuf::from("notes.md")),
                prompt: "fix typos".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_missing_value() {
        assert!(matches!(parse(&["--session"]), CliCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert!(matches!(parse(&["--unknown", "x"]), CliCommand::Invalid(_)));
    }

    #[test]
    fn test_double_dash_keeps_flags_in_prompt() {
        match parse(&["--", "explain", "--version"]) {
            CliCommand::Ask(args) => assert_eq!(args.prompt, "explain --version"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
