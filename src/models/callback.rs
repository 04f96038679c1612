use serde::{ Serialize, Deserialize };

/// Route of the callback request service on the HTTP API.
pub const CALLBACK_PATH: &str = "/api/twilio/call";

pub const PHONE_REQUIRED: &str = "Phone number is required";
pub const CALL_FAILED: &str = "Failed to initiate call";
pub const CALL_INITIATED: &str = "Call initiated successfully";
pub const NOT_CONFIGURED: &str = "Twilio is not configured yet. Please use WhatsApp instead.";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CallbackRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl CallbackRequest {
    pub fn to(number: impl Into<String>) -> Self {
        Self { to: Some(number.into()) }
    }

    /// The destination if present and non-empty. No other validation applies.
    pub fn destination(&self) -> Option<&str> {
        self.to.as_deref().filter(|to| !to.is_empty())
    }
}

/// Body of `200` and `501` responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackStatus {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
    pub message: String,
}

/// Body of `400` and `500` responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallbackFailure {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_destination_counts_as_missing() {
        assert_eq!(CallbackRequest::default().destination(), None);
        assert_eq!(CallbackRequest::to("").destination(), None);
        assert_eq!(CallbackRequest::to(" ").destination(), Some(" "));
    }

    #[test]
    fn status_uses_camel_case_call_sid() {
        let status = CallbackStatus {
            success: true,
            call_sid: Some("CA123".into()),
            message: CALL_INITIATED.into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["callSid"], "CA123");
    }
}
