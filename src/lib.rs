//! Sightline - client core for a conversational analytics agent backend
//!
//! A user submits a natural-language question; the backend's supervisor agent
//! orchestrates sub-agents (query refinement, database, visualization) and
//! streams trace events back over SSE. This crate consumes that stream,
//! projects it into short progress lines while the request is in flight,
//! classifies the final payload into a typed result, and manages dashboard
//! embeds and conversation history.
//!
//! This library exposes modules for use in integration tests.

pub mod app;
pub mod classify;
pub mod client;
pub mod config;
pub mod embed;
pub mod error;
pub mod models;
pub mod notice;
pub mod salvage;
pub mod sse;
pub mod store;
pub mod stream;
