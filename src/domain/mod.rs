pub mod entities;
pub mod errors;
pub mod evaluation;
pub mod ports;
pub mod ranking;
pub mod scoring;

pub use entities::*;
pub use errors::{DomainError, Result, SequenceKind};
