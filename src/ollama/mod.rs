//! Client and incremental decoder for the upstream generate endpoint.
mod client;
mod decoder;

pub use client::{GenerateError, OllamaClient, TokenStream};
pub use decoder::NdjsonDecoder;
