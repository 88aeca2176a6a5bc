//! The single `prompt -> text` call into a provider.

use salespulse_core::{Provider, ProviderError, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends a fully rendered prompt as one user message and returns the reply text.
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::prompt(&self.model, prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_len = prompt.len(),
            "Invoking LLM"
        );

        match self.provider.complete(request).await {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    debug!(
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "LLM call complete"
                    );
                }
                Ok(response.message.content)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "LLM call failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use salespulse_core::{Message, ProviderResponse, Role};
    use std::sync::Mutex;

    struct CapturingProvider {
        seen: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl Provider for CapturingProvider {
        fn name(&self) -> &str {
            "capture"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let reply = format!("echo:{}", request.messages[0].content);
            self.seen.lock().unwrap().push(request);
            Ok(ProviderResponse {
                message: Message::assistant(reply),
                usage: None,
                model: "capture-model".into(),
            })
        }
    }

    struct DownProvider;

    #[async_trait]
    impl Provider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(&self, _: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn sends_one_user_message() {
        let provider = Arc::new(CapturingProvider {
            seen: Mutex::new(Vec::new()),
        });
        let gateway = LlmGateway::new(provider.clone(), "gpt-4o-mini")
            .with_temperature(0.2)
            .with_max_tokens(512);

        let text = gateway.invoke("summarise this").await.unwrap();
        assert_eq!(text, "echo:summarise this");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4o-mini");
        assert_eq!(seen[0].temperature, 0.2);
        assert_eq!(seen[0].max_tokens, Some(512));
        assert_eq!(seen[0].messages.len(), 1);
        assert_eq!(seen[0].messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn provider_error_passes_through() {
        let gateway = LlmGateway::new(Arc::new(DownProvider), "m");
        let err = gateway.invoke("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
