//! Nullable fee policy with scripted verdicts.

use std::collections::HashMap;
use std::sync::Mutex;

use stakepool_transactions::{FeeEvaluation, FeePolicy, MsgTx};
use stakepool_types::StakeAddress;

/// A fee policy that answers from a script keyed by owner address and
/// records every call.
pub struct NullFeePolicy {
    default: FeeEvaluation,
    verdicts: Mutex<HashMap<String, FeeEvaluation>>,
    calls: Mutex<Vec<(String, i32)>>,
}

impl NullFeePolicy {
    /// Every ticket passes unless scripted otherwise.
    pub fn accepting() -> Self {
        Self::with_default(FeeEvaluation::valid())
    }

    pub fn with_default(default: FeeEvaluation) -> Self {
        Self {
            default,
            verdicts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer `verdict` for tickets owned by `owner`.
    pub fn with_verdict(self, owner: &str, verdict: FeeEvaluation) -> Self {
        self.verdicts
            .lock()
            .unwrap()
            .insert(owner.to_string(), verdict);
        self
    }

    /// `(owner, purchase_height)` of every evaluation, in order.
    pub fn calls(&self) -> Vec<(String, i32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl FeePolicy for NullFeePolicy {
    fn evaluate(&self, _tx: &MsgTx, purchase_height: i32, owner: &StakeAddress) -> FeeEvaluation {
        self.calls
            .lock()
            .unwrap()
            .push((owner.to_string(), purchase_height));
        self.verdicts
            .lock()
            .unwrap()
            .get(owner.as_str())
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}
