use crate::cli::Args;
use crate::contact::whatsapp::WhatsAppLink;
use crate::models::callback::CALLBACK_PATH;
use std::net::{ IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr };
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_REPLY_DELAY_MS: u64 = 1000;
pub const DEFAULT_INITIAL_GREETING: &str = "Hi! 👋 How can I help you today?";
pub const DEFAULT_WHATSAPP_DOMAIN: &str = "wa.me";
pub const DEFAULT_WHATSAPP_NUMBER: &str = "1234567890";
pub const DEFAULT_WHATSAPP_GREETING: &str = "Hi! I need help with CityGuardian.";
pub const DEFAULT_CALLBACK_URL: &str = "http://127.0.0.1:4001/api/twilio/call";
pub const DEFAULT_CALLBACK_NUMBER: &str = "+1234567890";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid WhatsApp deep link for '{number}' on '{domain}': {source}")]
    InvalidDeepLink {
        domain: String,
        number: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid callback URL '{url}': {source}")]
    InvalidCallbackUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Credentials for the outbound-call provider. Only read, never used to
/// place calls until a provider implementation exists.
#[derive(Clone, Debug, Default)]
pub struct TelephonyConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
}

impl TelephonyConfig {
    pub fn from_args(args: &Args) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            account_sid: non_empty(&args.twilio_account_sid),
            auth_token: non_empty(&args.twilio_auth_token),
            from_number: non_empty(&args.twilio_phone_number),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && self.from_number.is_some()
    }
}

/// Per-instance widget settings, shared read-only by every session.
#[derive(Clone, Debug)]
pub struct WidgetConfig {
    pub reply_delay: Duration,
    pub initial_greeting: Option<String>,
    pub whatsapp: WhatsAppLink,
    pub callback_url: String,
    pub callback_number: String,
}

impl WidgetConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let whatsapp = WhatsAppLink::new(
            &args.whatsapp_domain,
            &args.whatsapp_number,
            &args.whatsapp_greeting
        );
        whatsapp.url().map_err(|source| ConfigError::InvalidDeepLink {
            domain: args.whatsapp_domain.clone(),
            number: args.whatsapp_number.clone(),
            source,
        })?;

        let callback_url = match &args.callback_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => local_callback_url(args),
        };
        Url::parse(&callback_url).map_err(|source| {
            ConfigError::InvalidCallbackUrl { url: callback_url.clone(), source }
        })?;

        Ok(Self {
            reply_delay: Duration::from_millis(args.reply_delay_ms),
            initial_greeting: Some(args.initial_greeting.clone()).filter(|g| !g.trim().is_empty()),
            whatsapp,
            callback_url,
            callback_number: args.callback_number.clone(),
        })
    }
}

/// Callback endpoint on this process's own HTTP API. A wildcard bind
/// address is reached through loopback.
fn local_callback_url(args: &Args) -> String {
    let scheme = if args.enable_tls { "https" } else { "http" };
    let authority = match args.http_host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) if ip.is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), args.http_port).to_string()
        }
        Ok(IpAddr::V6(ip)) if ip.is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), args.http_port).to_string()
        }
        Ok(ip) => SocketAddr::new(ip, args.http_port).to_string(),
        Err(_) => format!("{}:{}", args.http_host, args.http_port),
    };
    format!("{}://{}{}", scheme, authority, CALLBACK_PATH)
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(DEFAULT_REPLY_DELAY_MS),
            initial_greeting: Some(DEFAULT_INITIAL_GREETING.to_string()),
            whatsapp: WhatsAppLink::new(
                DEFAULT_WHATSAPP_DOMAIN,
                DEFAULT_WHATSAPP_NUMBER,
                DEFAULT_WHATSAPP_GREETING
            ),
            callback_url: DEFAULT_CALLBACK_URL.to_string(),
            callback_number: DEFAULT_CALLBACK_NUMBER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn args_defaults_match_widget_defaults() {
        let args = Args::parse_from(["support-widget"]);
        let config = WidgetConfig::from_args(&args).unwrap();
        let defaults = WidgetConfig::default();

        assert_eq!(config.reply_delay, defaults.reply_delay);
        assert_eq!(config.initial_greeting, defaults.initial_greeting);
        assert_eq!(config.whatsapp, defaults.whatsapp);
        assert_eq!(config.callback_url, defaults.callback_url);
        assert_eq!(config.callback_number, defaults.callback_number);
    }

    #[test]
    fn rejects_unparseable_callback_url() {
        let args = Args::parse_from(["support-widget", "--callback-url", "not a url"]);
        assert!(matches!(
            WidgetConfig::from_args(&args),
            Err(ConfigError::InvalidCallbackUrl { .. })
        ));
    }

    #[test]
    fn callback_url_follows_http_api_settings() {
        let url = |argv: &[&str]| {
            let args = Args::parse_from(argv);
            WidgetConfig::from_args(&args).unwrap().callback_url
        };

        assert_eq!(
            url(&["support-widget", "--http-port", "5000"]),
            "http://127.0.0.1:5000/api/twilio/call"
        );
        assert_eq!(
            url(&["support-widget", "--enable-tls"]),
            "https://127.0.0.1:4001/api/twilio/call"
        );
        assert_eq!(
            url(&["support-widget", "--http-host", "0.0.0.0", "--http-port", "8080"]),
            "http://127.0.0.1:8080/api/twilio/call"
        );
        assert_eq!(
            url(&["support-widget", "--http-host", "::"]),
            "http://[::1]:4001/api/twilio/call"
        );
        assert_eq!(
            url(&["support-widget", "--http-host", "support.local"]),
            "http://support.local:4001/api/twilio/call"
        );
    }

    #[test]
    fn explicit_callback_url_wins() {
        let args = Args::parse_from([
            "support-widget",
            "--http-port",
            "5000",
            "--callback-url",
            "https://calls.example.com/api/twilio/call",
        ]);
        let config = WidgetConfig::from_args(&args).unwrap();
        assert_eq!(config.callback_url, "https://calls.example.com/api/twilio/call");
    }

    #[test]
    fn blank_greeting_disables_seeding() {
        let args = Args::parse_from(["support-widget", "--initial-greeting", " "]);
        let config = WidgetConfig::from_args(&args).unwrap();
        assert!(config.initial_greeting.is_none());
    }

    #[test]
    fn telephony_requires_all_credentials() {
        let args = Args::parse_from([
            "support-widget",
            "--twilio-account-sid",
            "AC123",
            "--twilio-auth-token",
            "secret",
        ]);
        let telephony = TelephonyConfig::from_args(&args);
        assert!(!telephony.is_complete());
        assert_eq!(telephony.account_sid.as_deref(), Some("AC123"));
    }
}
