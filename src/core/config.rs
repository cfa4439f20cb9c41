use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let ollama_url =
            env::var("RELAY_OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        let ollama_model =
            env::var("RELAY_OLLAMA_MODEL").unwrap_or_else(|_| "deepseek-r1:1.5b".to_string());

        Self {
            ollama_url,
            ollama_model,
        }
    }
}
