//! Turn orchestration.
//!
//! - [`TurnController`] runs one turn: stream, interpret, apply
//! - [`ToolCallContext`] / tool round trip: answer mid-stream document requests
//! - [`SessionStreamRegistry`] keeps at most one active turn per session
//! - [`TurnEvent`] feed for incremental rendering

pub mod controller;
pub mod events;
pub mod registry;
pub mod state;
pub mod tool_round_trip;

pub use controller::{
    Collaborators, TurnController, TurnHandle, TurnOutcome, TurnRequest, LATE_FRAME_GRACE,
};
pub use events::{create_event_channel, TurnEvent, TurnEventKind, TurnEventSender};
pub use registry::{SessionStreamRegistry, EVENT_CHANNEL_CAPACITY};
pub use state::{lock_conversation, SharedConversation, Turn};
pub use tool_round_trip::{ToolCallContext, RETRIEVING_STATUS};
