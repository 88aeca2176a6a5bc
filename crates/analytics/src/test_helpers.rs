//! Shared test helpers: a provider that records every prompt it receives.

use async_trait::async_trait;
use salespulse_core::{Message, Provider, ProviderError, ProviderRequest, ProviderResponse};
use std::sync::Mutex;
use std::time::Duration;

/// Replies `"summary of N"` when the prompt carries a `ROWMARKN` token,
/// otherwise `"reply K"` for the K-th call (1-based).
pub(crate) struct RecordingProvider {
    prompts: Mutex<Vec<String>>,
    fail_on: Option<usize>,
    staggered: bool,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail_on: None,
            staggered: false,
        }
    }

    /// Fail the given call (1-based) with a server error.
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::new()
        }
    }

    /// Prompts marked lower finish later, so completion order is reversed.
    pub fn staggered() -> Self {
        Self {
            staggered: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub(crate) fn marker_in(prompt: &str) -> Option<u64> {
    let start = prompt.find("ROWMARK")? + "ROWMARK".len();
    let digits: String = prompt[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request.messages[0].content.clone();
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.clone());
            prompts.len()
        };

        if self.fail_on == Some(call) {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "upstream exploded".into(),
            });
        }

        let reply = match marker_in(&prompt) {
            Some(marker) => {
                if self.staggered {
                    let wait = 200u64.saturating_sub(marker * 10);
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                }
                format!("summary of {marker}")
            }
            None => format!("reply {call}"),
        };

        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: None,
            model: request.model,
        })
    }
}
