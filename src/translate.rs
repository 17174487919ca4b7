use crate::error::RelayError;
use crate::types::{DeviceReply, VerificationOutcome};

/// Map the backend round trip onto the reply a terminal understands.
///
/// Anything other than an explicit success, a transport failure included,
/// becomes a bare `{"Status":0}`.
pub fn translate(outcome: Result<VerificationOutcome, RelayError>) -> DeviceReply {
    match outcome {
        Ok(o) if o.is_success() => DeviceReply {
            status: 1,
            status_desc: Some(o.message).filter(|m| !m.is_empty()),
            actuation: o.actuation,
        },
        Ok(_) | Err(_) => DeviceReply::denied(),
    }
}
