use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{CheckoutSession, CheckoutSessionRequest, PaymentGateway, ProviderError, ProviderErrorKind};

/// In-process gateway for local development and tests. Sessions get
/// `cs_test_mock_` ids and every request is kept for inspection.
#[derive(Debug, Default)]
pub struct MockGateway {
    requests: Mutex<Vec<CheckoutSessionRequest>>,
    fail_with: Option<ProviderErrorKind>,
}

impl MockGateway {
    /// Gateway whose every call fails with `kind`.
    pub fn failing(kind: ProviderErrorKind) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_with: Some(kind),
        }
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|guard| guard.len()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }
        if let Some(kind) = self.fail_with {
            return Err(ProviderError::new(kind, "mock gateway configured to fail"));
        }

        let id = format!("cs_test_mock_{}", Uuid::new_v4().simple());
        tracing::debug!(session_id = %id, amount = request.amount_cents, "mock checkout session created");
        let url = request.success_url.replace("{CHECKOUT_SESSION_ID}", &id);
        Ok(CheckoutSession { id, url: Some(url) })
    }
}
