//! CLI module for parlor.
//!
//! - Argument parsing
//! - Version display
//! - Streaming a prompt and rendering the reply
//!
//! # Usage
//!
//! ```ignore
//! use parlor::cli::{parse_args, run_cli_command, CliCommand};
//!
//! let command = parse_args(std::env::args());
//! if let Some(result) = run_cli_command(&command) {
//!     return result;
//! }
//! // `CliCommand::Ask`: stream the prompt
//! ```

pub mod args;
pub mod ask;
pub mod render;
pub mod version;

pub use args::{parse_args, AskArgs, CliCommand, USAGE};
pub use ask::{build_registry, run_ask};
pub use render::TranscriptRenderer;
pub use version::{handle_version_command, VERSION};

use color_eyre::eyre::eyre;
use color_eyre::Result;

/// Run a command that needs no turn.
///
/// # Returns
///
/// * `None` - for `Ask`, which the caller streams
/// * `Some(Ok(()))` - help was printed
/// * `Some(Err(e))` - the arguments were invalid
///
/// # Note
///
/// The `Version` command never returns as it calls `std::process::exit(0)`.
pub fn run_cli_command(command: &CliCommand) -> Option<Result<()>> {
    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => {
            println!("{}", USAGE);
            Some(Ok(()))
        }
        CliCommand::Invalid(reason) => Some(Err(eyre!("{}\n{}", reason, USAGE))),
        CliCommand::Ask(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_returns_none() {
        let command = CliCommand::Ask(AskArgs {
            session_id: None,
            document: None,
            prompt: "hi".to_string(),
        });
        assert!(run_cli_command(&command).is_none());
    }

    #[test]
    fn test_invalid_is_an_error() {
        let result = run_cli_command(&CliCommand::Invalid("bad".to_string()));
        assert!(matches!(result, Some(Err(_))));
    }
}
