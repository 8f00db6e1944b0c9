//! Streams one prompt from the command line.

use std::io;
use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::broadcast::error::RecvError;

use super::args::AskArgs;
use super::render::TranscriptRenderer;
use crate::adapters::{FileDocumentSurface, ReqwestTransport};
use crate::config::ClientConfig;
use crate::traits::StreamTransport;
use crate::turn::{Collaborators, SessionStreamRegistry, TurnController, TurnOutcome};

/// Build a registry talking to the configured service.
pub fn build_registry(
    config: ClientConfig,
    transport: Arc<dyn StreamTransport>,
    args: &AskArgs,
) -> SessionStreamRegistry {
    let document = Arc::new(FileDocumentSurface::new(args.document.clone()));
    let collaborators = Collaborators::default()
        .with_document(document.clone())
        .with_editor(document);
    SessionStreamRegistry::new(TurnController::new(config, transport, collaborators))
}

/// Run the turn, printing it as it streams. Ctrl-C aborts.
pub async fn run_ask(args: AskArgs, config: ClientConfig) -> Result<TurnOutcome> {
    let registry = build_registry(config, Arc::new(ReqwestTransport::new()), &args);
    let session_id = args
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut feed = registry.subscribe();
    let handle = registry.start(&session_id, args.prompt.clone(), Vec::new());
    let turn_id = handle.id().to_string();
    tracing::debug!(session_id = %session_id, turn_id = %turn_id, "Streaming prompt");

    let mut renderer = TranscriptRenderer::new();
    let (mut out, mut err) = (io::stdout(), io::stderr());

    let wait = handle.wait();
    tokio::pin!(wait);

    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            event = feed.recv() => match event {
                Ok(event) if event.turn_id == turn_id => renderer.render(&event, &mut out, &mut err)?,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Render feed lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                registry.abort(&session_id);
            }
        }
    };

    while let Ok(event) = feed.try_recv() {
        if event.turn_id == turn_id {
            renderer.render(&event, &mut out, &mut err)?;
        }
    }
    renderer.finish(&mut out)?;

    Ok(outcome)
}
