use serde::{Deserialize, Serialize};

/// Lifecycle state of a turn.
///
/// ```text
/// idle → streaming → [awaiting-tool → streaming]* → done | aborted | error
/// ```
///
/// `aborted` and `error` are also reachable from `idle` and `awaiting-tool`.
/// Terminal states have no outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnStatus {
    Idle,
    Streaming,
    AwaitingTool,
    Done,
    Aborted,
    Error,
}

impl TurnStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStatus::Done | TurnStatus::Aborted | TurnStatus::Error)
    }

    /// Streaming or waiting on a tool round trip
    pub fn is_active(&self) -> bool {
        matches!(self, TurnStatus::Streaming | TurnStatus::AwaitingTool)
    }

    pub fn can_transition_to(&self, next: TurnStatus) -> bool {
        use TurnStatus::*;
        matches!(
            (self, next),
            (Idle, Streaming)
                | (Idle, Aborted)
                | (Idle, Error)
                | (Streaming, AwaitingTool)
                | (Streaming, Done)
                | (Streaming, Aborted)
                | (Streaming, Error)
                | (AwaitingTool, Streaming)
                | (AwaitingTool, Aborted)
                | (AwaitingTool, Error)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStatus::Idle => "idle",
            TurnStatus::Streaming => "streaming",
            TurnStatus::AwaitingTool => "awaiting-tool",
            TurnStatus::Done => "done",
            TurnStatus::Aborted => "aborted",
            TurnStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
