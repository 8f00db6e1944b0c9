//! Error handling for the turn orchestrator.
//!
//! | Error | Scope | Effect |
//! |-------|-------|--------|
//! | `FrameDecodeError` (in `sse`) | one frame | dropped, parsing continues |
//! | `TransportError` | connection/body | turn → error, partial content kept |
//! | `TurnError::ToolContextFetch` | document fetch | error message appended, turn → error |
//! | `TurnError::ProtocolViolation` | server misbehavior | turn → error |
//! | `TurnError::Server` | backend-reported error | turn → error |
//! | `TurnError::SessionBusy` | `try_start` on a busy session | rejected, nothing changes |
//!
//! User cancellation is not an error: it is the `aborted` terminal state.

mod collaborator;
mod result;
mod transport;
mod turn;

pub use collaborator::CollaboratorError;
pub use result::ParlorResult;
pub use transport::TransportError;
pub use turn::TurnError;
