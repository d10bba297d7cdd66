//! Structured generation client
//!
//! Wraps the external generative-text provider behind a narrow contract:
//! prompt in, schema-conformant value out (or a hard failure). The layers,
//! bottom up: provider HTTP clients, JSON payload extraction, declarative
//! shape repair, typed validation with retries.

pub mod client;
pub mod extract;
pub mod provider;
pub mod repair;

pub use client::{GenerationClient, GenerationError, DEFAULT_MAX_RETRIES};
pub use provider::{provider_from_config, GenerationProvider, ProviderError};
