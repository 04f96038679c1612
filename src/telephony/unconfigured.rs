use async_trait::async_trait;
use log::debug;
use super::{ CallProvider, ProviderError, ProviderOutcome };

/// Placeholder until a real provider is wired in. Every call reports
/// [`ProviderOutcome::NotConfigured`] regardless of input.
pub struct UnconfiguredProvider {
    credentials_present: bool,
}

impl UnconfiguredProvider {
    pub fn new(credentials_present: bool) -> Self {
        Self { credentials_present }
    }
}

#[async_trait]
impl CallProvider for UnconfiguredProvider {
    async fn place_call(&self, to: &str) -> Result<ProviderOutcome, ProviderError> {
        debug!(
            "Skipping outbound call to {} (credentials present: {})",
            to,
            self.credentials_present
        );
        Ok(ProviderOutcome::NotConfigured)
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}
