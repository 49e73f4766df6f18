//! `VerificationDispatcher`: picks a validator via the registry and
//! delivers a `VerifyTxReq`, tagging nothing extra — the validator's
//! `VerifyTxRsp` is expected to return to `MempoolServer` out of band. §4.2.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::entities::{DispatchRequest, VerifyTxReq};
use crate::domain::ValidatorRegistry;
use crate::ports::outbound::ValidatorHandle;

/// Sends a `DispatchRequest` to one validator of the requested kind,
/// chosen from the shared registry by round robin.
pub struct VerificationDispatcher<V> {
    registry: Arc<Mutex<ValidatorRegistry<V>>>,
}

impl<V: ValidatorHandle> VerificationDispatcher<V> {
    /// Wraps a shared registry.
    #[must_use]
    pub fn new(registry: Arc<Mutex<ValidatorRegistry<V>>>) -> Self {
        Self { registry }
    }

    /// Dispatches one request. Silently drops it (logging at debug) if no
    /// validator of the requested type is currently registered; the entry
    /// stays in `Checking` and is retried by the next timeout sweep.
    pub async fn dispatch(&self, req: DispatchRequest) {
        let handle = {
            let mut registry = self.registry.lock();
            registry.next(req.verify_type).cloned()
        };
        match handle {
            Some(handle) => handle.send_verify(VerifyTxReq { tx: req.tx }).await,
            None => {
                tracing::debug!(verify_type = ?req.verify_type, "no eligible validator, request dropped");
            }
        }
    }

    /// Dispatches every request in `reqs`, in order.
    pub async fn dispatch_all(&self, reqs: Vec<DispatchRequest>) {
        for req in reqs {
            self.dispatch(req).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Transaction, VerifyType};
    use crate::ports::outbound::RecordingValidatorHandle;

    fn sample_tx() -> Transaction {
        Transaction {
            from: [1u8; 32],
            to: Some([2u8; 32]),
            value: 0,
            nonce: 0,
            gas_limit: 21_000,
            gas_price: 1,
            data: Vec::new(),
            signature: [0u8; 64],
        }
    }

    #[tokio::test]
    async fn dispatch_with_no_validator_is_a_silent_noop() {
        let registry: Arc<Mutex<ValidatorRegistry<RecordingValidatorHandle>>> = Arc::new(Mutex::new(ValidatorRegistry::new()));
        let dispatcher = VerificationDispatcher::new(registry);
        dispatcher
            .dispatch(DispatchRequest {
                verify_type: VerifyType::Stateless,
                tx: sample_tx(),
            })
            .await;
    }

    #[tokio::test]
    async fn dispatch_delivers_to_registered_validator() {
        let registry: Arc<Mutex<ValidatorRegistry<RecordingValidatorHandle>>> = Arc::new(Mutex::new(ValidatorRegistry::new()));
        let validator = RecordingValidatorHandle::default();
        registry.lock().register(VerifyType::Stateless, "v1".into(), validator.clone());

        let dispatcher = VerificationDispatcher::new(registry);
        dispatcher
            .dispatch(DispatchRequest {
                verify_type: VerifyType::Stateless,
                tx: sample_tx(),
            })
            .await;

        assert_eq!(validator.verify_requests.lock().unwrap().len(), 1);
    }
}
