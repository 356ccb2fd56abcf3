//! Uniform `{ success, data | error }` reply shape for service calls.

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a service call as presented to a caller.
///
/// Exactly one of `data` and `error` is set, matching `success`.
///
/// # Examples
/// ```
/// use tourdesk_core::Envelope;
///
/// let ok: Envelope<u32> = Ok::<_, std::fmt::Error>(3).into();
/// assert!(ok.success);
/// assert_eq!(ok.data, Some(3));
///
/// let failed = Envelope::<u32>::err("tour 9 not found");
/// assert!(!failed.success);
/// assert_eq!(failed.error.as_deref(), Some("tour 9 not found"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Envelope<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Payload on success.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub data: Option<T>,
    /// Message on failure.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// A successful reply.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed reply.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Convert back into a `Result`, with the message as the error.
    pub fn into_result(self) -> Result<T, String> {
        match (self.data, self.error) {
            (Some(data), _) if self.success => Ok(data),
            (_, Some(message)) => Err(message),
            _ => Err("reply carried neither data nor an error".to_owned()),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(err.to_string()),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn failure_omits_data() {
        let envelope = Envelope::<Vec<u32>>::err("nope");
        let value = serde_json::to_value(&envelope).expect("serialise envelope");
        assert_eq!(value, json!({ "success": false, "error": "nope" }));
    }

    #[rstest]
    fn success_omits_error() {
        let value = serde_json::to_value(Envelope::ok(vec![1, 2])).expect("serialise envelope");
        assert_eq!(value, json!({ "success": true, "data": [1, 2] }));
    }
}
