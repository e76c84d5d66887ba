//! Content digest of a decision sequence, used to assert replay determinism.

use crate::domain::Decision;

/// BLAKE3 hex digest over the decisions in order. Sizing hints are hashed by
/// their bit pattern, so any numeric drift changes the digest.
pub fn decision_digest(decisions: &[Decision]) -> String {
    let mut hasher = blake3::Hasher::new();
    for decision in decisions {
        match decision {
            Decision::NoAction => {
                hasher.update(&[0]);
            }
            Decision::EnterLong { sizing_hint } => {
                hasher.update(&[1]);
                hasher.update(&sizing_hint.to_bits().to_le_bytes());
            }
            Decision::ExitLong { reason } => {
                hasher.update(&[2]);
                hasher.update(reason.as_str().as_bytes());
                hasher.update(&[0]);
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}
