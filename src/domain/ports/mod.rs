mod encoder;
mod token_store;

pub use encoder::{EncodeMode, TokenEncoder};
pub use token_store::TokenStore;
