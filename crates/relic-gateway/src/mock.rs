//! Programmable in-memory gateway for tests.
//!
//! The fulfillment rollback path hinges on what the gateway returns, so
//! tests need a gateway whose answer they choose. `MockGateway` records
//! every create request it sees and replays a configured behavior.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use relic_core::Money;

use crate::error::GatewayError;
use crate::types::{CreateCodeRequest, GatewayPaymentStatus, PayableCode, PaymentDetails};
use crate::PaymentGateway;

/// What the mock should do on `create_payable_code`.
#[derive(Debug, Clone)]
enum CreateBehavior {
    /// Return a payable URL derived from the merchant payment id.
    Succeed,
    /// Return a provider rejection.
    Reject { code: String, message: String },
    /// Report success but omit the payable URL.
    OmitUrl,
}

/// In-memory [`PaymentGateway`] with scripted responses.
pub struct MockGateway {
    create_behavior: Mutex<CreateBehavior>,
    details: Mutex<Option<PaymentDetails>>,
    requests: Mutex<Vec<CreateCodeRequest>>,
}

impl MockGateway {
    /// A gateway that accepts every checkout.
    pub fn succeeding() -> Self {
        MockGateway {
            create_behavior: Mutex::new(CreateBehavior::Succeed),
            details: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A gateway that rejects every checkout with the given result code.
    pub fn rejecting(code: impl Into<String>, message: impl Into<String>) -> Self {
        let gateway = MockGateway::succeeding();
        *gateway.create_behavior.lock().unwrap() = CreateBehavior::Reject {
            code: code.into(),
            message: message.into(),
        };
        gateway
    }

    /// A gateway that "succeeds" without returning a payable URL.
    pub fn without_url() -> Self {
        let gateway = MockGateway::succeeding();
        *gateway.create_behavior.lock().unwrap() = CreateBehavior::OmitUrl;
        gateway
    }

    /// Scripts the answer for `get_payment_details`.
    pub fn set_payment_details(&self, details: PaymentDetails) {
        *self.details.lock().unwrap() = Some(details);
    }

    /// Every create request received so far, in order.
    pub fn recorded_requests(&self) -> Vec<CreateCodeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payable_code(
        &self,
        request: CreateCodeRequest,
    ) -> Result<PayableCode, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());

        match self.create_behavior.lock().unwrap().clone() {
            CreateBehavior::Succeed => Ok(PayableCode {
                url: format!("https://pay.example/checkout/{}", request.merchant_payment_id),
                code_id: format!("code-{}", request.merchant_payment_id),
                expires_at: None,
            }),
            CreateBehavior::Reject { code, message } => {
                Err(GatewayError::Rejected { code, message })
            }
            CreateBehavior::OmitUrl => Err(GatewayError::MissingPayableUrl),
        }
    }

    async fn get_payment_details(
        &self,
        _merchant_payment_id: &str,
    ) -> Result<PaymentDetails, GatewayError> {
        let scripted = *self.details.lock().unwrap();
        Ok(scripted.unwrap_or(PaymentDetails {
            status: GatewayPaymentStatus::Created,
            requested_at: Some(Utc::now()),
            accepted_at: None,
            amount: Money::zero(),
        }))
    }
}
