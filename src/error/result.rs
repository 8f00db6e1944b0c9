//! Result type alias for turn operations.

use super::turn::TurnError;

/// Type alias for Results using `TurnError`.
///
/// # Example
///
/// ```ignore
/// use parlor::error::ParlorResult;
///
/// fn start(session_id: &str) -> ParlorResult<TurnHandle> {
///     // ...
/// }
/// ```
pub type ParlorResult<T> = Result<T, TurnError>;
