//! Deterministic fake `LlmClient` for tests: scripted fixed or per-call responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::LlmError;

use super::LlmClient;

/// Returns a fixed string, or advances through a scripted sequence of responses
/// (one per call, holding the last entry once exhausted). Optionally records every
/// `(system, user, model, temperature)` call for assertion in tests.
pub struct MockLlmClient {
    responses: Vec<String>,
    call_count: AtomicUsize,
    calls: Mutex<Vec<(String, String, String, f32)>>,
    fail_after: Option<usize>,
}

impl MockLlmClient {
    /// A mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            responses: vec![response.into()],
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// A mock that returns each scripted response in order, then repeats the last.
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            responses,
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// Fails every call from the `n`th onward (0-indexed), useful for retry tests.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, String, String, f32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, system: &str, user: &str, model: &str, temperature: f32) -> Result<String, LlmError> {
        let n = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string(), model.to_string(), temperature));

        if let Some(fail_after) = self.fail_after {
            if n >= fail_after {
                return Err(LlmError::Request("mock configured to fail".to_string()));
            }
        }

        if self.responses.is_empty() {
            return Ok(String::new());
        }
        let idx = n.min(self.responses.len() - 1);
        Ok(self.responses[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_always_returns_same_value() {
        let mock = MockLlmClient::fixed("hi");
        assert_eq!(mock.complete("s", "u", "m", 0.0).await.unwrap(), "hi");
        assert_eq!(mock.complete("s", "u", "m", 0.0).await.unwrap(), "hi");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn scripted_advances_then_repeats_last() {
        let mock = MockLlmClient::scripted(vec!["a".into(), "b".into()]);
        assert_eq!(mock.complete("s", "u", "m", 0.0).await.unwrap(), "a");
        assert_eq!(mock.complete("s", "u", "m", 0.0).await.unwrap(), "b");
        assert_eq!(mock.complete("s", "u", "m", 0.0).await.unwrap(), "b");
    }

    #[tokio::test]
    async fn failing_after_errors_from_nth_call() {
        let mock = MockLlmClient::fixed("ok").failing_after(1);
        assert!(mock.complete("s", "u", "m", 0.0).await.is_ok());
        assert!(mock.complete("s", "u", "m", 0.0).await.is_err());
    }
}
