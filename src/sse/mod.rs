//! Event stream parsing.
//!
//! The generation service answers with newline-terminated `data:` frames,
//! each holding a JSON object or the literal terminal token.
//!
//! # Module structure
//! - `events` - Frame and action types (Frame, DecodedFrame, StreamAction, FrameDecodeError)
//! - `payloads` - Wire payload deserialization structs
//! - `parser` - Chunk reassembly (FrameParser, decode_frame)
//! - `interpreter` - Payload to action mapping
//! - `stream` - Lazy frame stream over a response body

mod events;
mod interpreter;
mod parser;
mod payloads;
mod stream;

pub use events::{DecodedFrame, Frame, FrameDecodeError, StreamAction};
pub use interpreter::{interpret, interpret_frame};
pub use parser::{decode_frame, FrameParser, DEFAULT_FRAME_PREFIX, DEFAULT_TERMINAL_TOKEN};
pub use payloads::{ToolCallDetails, ToolCallField, WirePayload};
pub use stream::{frame_stream, FrameStream};
