use crate::models::callback::{ CallbackFailure, CallbackRequest, CallbackStatus, CALL_INITIATED };
use log::{ error, info, warn };
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Invalid callback endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Callback request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Malformed callback response (HTTP {status}): {source}")]
    MalformedResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Any 2xx. The call id is only known when the service returned one.
    Initiated {
        call_sid: Option<String>,
        message: String,
    },
    /// No telephony provider is wired in yet. Expected steady state, not a fault.
    NotConfigured {
        message: String,
    },
    Rejected {
        status: u16,
        error: String,
    },
}

impl CallbackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallbackOutcome::Initiated { .. })
    }
}

/// Passive, user-facing advisory for the "Call Me" shortcut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    CallScheduled,
    CallUnavailable,
    CallError,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Notice::CallScheduled => "We'll call you shortly!",
            Notice::CallUnavailable => "Unable to initiate call. Please try WhatsApp instead.",
            Notice::CallError => "Error initiating call. Please use WhatsApp or email.",
        }
    }

    /// Every outcome, including transport failure, collapses into a notice.
    pub fn for_result(result: &Result<CallbackOutcome, CallbackError>) -> Self {
        match result {
            Ok(outcome) if outcome.is_success() => Notice::CallScheduled,
            Ok(_) => Notice::CallUnavailable,
            Err(_) => Notice::CallError,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CallbackClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl CallbackClient {
    pub fn new(endpoint: &str) -> Result<Self, CallbackError> {
        let endpoint = Url::parse(endpoint).map_err(|source| CallbackError::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;
        Ok(Self { client: reqwest::Client::new(), endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn request_callback(&self, to: &str) -> Result<CallbackOutcome, CallbackError> {
        info!("Requesting callback via {}", self.endpoint);
        let response = self.client
            .post(self.endpoint.clone())
            .json(&CallbackRequest::to(to))
            .send().await?;

        let status = response.status();
        let body = response.bytes().await?;
        let malformed = |source| CallbackError::MalformedResponse { status: status.as_u16(), source };

        let outcome = if status == StatusCode::NOT_IMPLEMENTED {
            let parsed: CallbackStatus = serde_json::from_slice(&body).map_err(malformed)?;
            CallbackOutcome::NotConfigured { message: parsed.message }
        } else if status.is_success() {
            if body.iter().all(u8::is_ascii_whitespace) {
                CallbackOutcome::Initiated { call_sid: None, message: CALL_INITIATED.to_string() }
            } else {
                let parsed: CallbackStatus = serde_json::from_slice(&body).map_err(malformed)?;
                if parsed.success {
                    CallbackOutcome::Initiated { call_sid: parsed.call_sid, message: parsed.message }
                } else {
                    CallbackOutcome::Rejected { status: status.as_u16(), error: parsed.message }
                }
            }
        } else {
            let error = serde_json
                ::from_slice::<CallbackFailure>(&body)
                .map(|f| f.error)
                .unwrap_or_else(|_| {
                    status.canonical_reason().unwrap_or("Unexpected response").to_string()
                });
            CallbackOutcome::Rejected { status: status.as_u16(), error }
        };

        match &outcome {
            CallbackOutcome::Initiated { call_sid, .. } =>
                info!("Callback initiated: {}", call_sid.as_deref().unwrap_or("no call id")),
            CallbackOutcome::NotConfigured { message } => warn!("Callback unavailable: {}", message),
            CallbackOutcome::Rejected { status, error: e } =>
                error!("Callback rejected with HTTP {}: {}", status, e),
        }
        Ok(outcome)
    }

    /// Runs the request and absorbs every failure into a [`Notice`].
    pub async fn notify(&self, to: &str) -> Notice {
        let result = self.request_callback(to).await;
        if let Err(e) = &result {
            error!("Callback call error: {}", e);
        }
        Notice::for_result(&result)
    }
}
