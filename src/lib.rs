//! parlor - client-side orchestrator for streamed conversational turns.
//!
//! A turn sends a prompt to a generation service, renders the streamed reply
//! into a per-session conversation, answers mid-stream requests for the
//! current document, and ends on completion, error or user abort.
//!
//! - [`sse`] cuts the byte stream into frames and interprets them
//! - [`models`] holds the conversation and wire types
//! - [`turn`] drives turns and keeps one active turn per session
//! - [`traits`] / [`adapters`] connect transport and collaborators

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod sse;
pub mod traits;
pub mod turn;
