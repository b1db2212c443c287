//! Application layer - Use cases and orchestration.
//!
//! Services depend on domain ports (traits) rather than concrete
//! implementations.

pub mod services;

pub use services::{AddSummary, EncodingService, RetrievalService};
