//! # PDM Common Library
//!
//! Shared code for the PDM privacy data mapping services:
//! - Error types
//! - Configuration loading and root folder resolution
//! - Pipeline progress event types
//! - Job registry and progress channel

pub mod config;
pub mod error;
pub mod events;
pub mod jobs;

pub use error::{Error, Result};
