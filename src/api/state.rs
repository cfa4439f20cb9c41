use crate::core::AppConfig;
use crate::ollama::OllamaClient;

pub struct AppState {
    pub config: AppConfig,
    pub ollama: OllamaClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let ollama = OllamaClient::new(&config);
        Self { config, ollama }
    }
}
