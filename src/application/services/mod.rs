mod encoding;
mod retrieval;

pub use encoding::EncodingService;
pub use retrieval::{AddSummary, RetrievalService};
