//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless text-generation collaborator - each call is independent
///
/// The model identifier is bound to the client at construction, so every
/// pipeline stage holds its own client configured for its own model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier this client sends requests to
    fn model(&self) -> &str;

    /// Send a single completion request and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    type Responder = Box<dyn Fn(usize, &CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

    /// Mock LLM client for unit tests
    pub struct MockLlmClient {
        responder: Responder,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        /// Replays `responses` in order, erroring once they run out
        pub fn new(responses: Vec<&str>) -> Self {
            let responses: Vec<String> = responses.into_iter().map(String::from).collect();
            debug!(response_count = %responses.len(), "MockLlmClient::new: called");
            Self::with_responder(move |idx, _| {
                responses
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| LlmError::InvalidResponse("No more mock responses".to_string()))
            })
        }

        /// Computes each response from the call index and request
        pub fn with_responder(
            f: impl Fn(usize, &CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                responder: Box::new(f),
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Always fails with an API error
        pub fn failing(status: u16) -> Self {
            Self::with_responder(move |_, _| {
                Err(LlmError::ApiError {
                    status,
                    message: "mock failure".to_string(),
                })
            })
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Every request received so far
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        fn model(&self) -> &str {
            "mock-model"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, "MockLlmClient::complete: called");
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let text = (self.responder)(idx, &request)?;
            Ok(CompletionResponse::text(text))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_responses() {
            let client = MockLlmClient::new(vec!["Response 1", "Response 2"]);
            let req = CompletionRequest::single("Test", "hello", 1000);

            let resp1 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp1.content, Some("Response 1".to_string()));

            let resp2 = client.complete(req).await.unwrap();
            assert_eq!(resp2.content, Some("Response 2".to_string()));

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.requests().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_records_failed_calls() {
            let client = MockLlmClient::failing(503);
            let result = client.complete(CompletionRequest::single("Test", "Task: root", 10)).await;

            assert!(result.is_err());
            assert_eq!(client.call_count(), 1);
            assert_eq!(client.requests().len(), 1);
            assert_eq!(client.requests()[0].last_user_text(), Some("Task: root"));
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);
            let result = client.complete(CompletionRequest::single("Test", "hello", 10)).await;
            assert!(result.is_err());
        }
    }
}
