mod unconfigured;

use crate::config::TelephonyConfig;
use async_trait::async_trait;
use log::{ info, warn };
use std::sync::Arc;
use thiserror::Error;

pub use unconfigured::UnconfiguredProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Telephony provider error: {0}")]
    Provider(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderOutcome {
    Initiated {
        call_sid: String,
    },
    NotConfigured,
}

/// Places outbound calls on behalf of the callback route.
#[async_trait]
pub trait CallProvider: Send + Sync {
    async fn place_call(&self, to: &str) -> Result<ProviderOutcome, ProviderError>;

    fn name(&self) -> &'static str;
}

pub fn new_provider(config: &TelephonyConfig) -> Arc<dyn CallProvider> {
    if config.is_complete() {
        warn!("Telephony credentials found but no provider is integrated; calls stay disabled.");
    } else {
        info!("No telephony credentials configured; callback requests will report not configured.");
    }
    Arc::new(UnconfiguredProvider::new(config.is_complete()))
}
