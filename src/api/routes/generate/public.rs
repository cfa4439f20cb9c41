//! Public types for the generate relay API
use serde::Deserialize;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}
