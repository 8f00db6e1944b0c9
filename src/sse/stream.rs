//! Lazy frame stream over a response body.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::stream::{self, Stream};
use futures_util::StreamExt;

use super::events::{DecodedFrame, Frame};
use super::parser::{decode_frame, FrameParser};
use crate::error::TransportError;
use crate::traits::ByteStream;

/// Decoded frames, or the transport error that ended the body.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<DecodedFrame, TransportError>> + Send>>;

/// Wrap a byte stream so it yields decoded frames in arrival order.
///
/// Chunks are pulled only when the consumer asks for the next frame.
/// Malformed frames are logged and skipped. A transport error is yielded
/// once and ends the stream.
pub fn frame_stream(bytes: ByteStream, mut parser: FrameParser) -> FrameStream {
    parser.reset();

    let frames = stream::unfold(
        (bytes, parser, VecDeque::<Frame>::new(), false),
        |(mut bytes, mut parser, mut pending, mut exhausted)| async move {
            loop {
                while let Some(frame) = pending.pop_front() {
                    match decode_frame(frame) {
                        Ok(decoded) => {
                            return Some((Ok(decoded), (bytes, parser, pending, exhausted)));
                        }
                        Err(err) => {
                            tracing::warn!("Dropping malformed frame: {}", err);
                        }
                    }
                }

                if exhausted {
                    return None;
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => pending.extend(parser.push(&chunk)),
                    Some(Err(err)) => {
                        exhausted = true;
                        return Some((Err(err), (bytes, parser, pending, exhausted)));
                    }
                    None => {
                        exhausted = true;
                        pending.extend(parser.finish());
                    }
                }
            }
        },
    );

    Box::pin(frames)
}
