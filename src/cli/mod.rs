use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the widget WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Host address for the HTTP API (callback service, deep link lookup).
    #[arg(long, env = "HTTP_HOST", default_value = "127.0.0.1")]
    pub http_host: String,

    /// Port for the HTTP API.
    #[arg(long, env = "HTTP_PORT", default_value = "4001")]
    pub http_port: u16,

    /// Optional API Key required for clients to connect to the WebSocket server. If set, clients must provide this key.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    // --- Widget Args ---
    /// Simulated typing delay before the canned reply is appended, in milliseconds.
    #[arg(long, env = "REPLY_DELAY_MS", default_value = "1000")]
    pub reply_delay_ms: u64,

    /// Agent message seeded into every new transcript. Empty disables it.
    #[arg(long, env = "INITIAL_GREETING", default_value = "Hi! 👋 How can I help you today?")]
    pub initial_greeting: String,

    // --- Quick Contact Args ---
    /// Messaging domain for the deep link (e.g., wa.me)
    #[arg(long, env = "WHATSAPP_DOMAIN", default_value = "wa.me")]
    pub whatsapp_domain: String,

    /// WhatsApp business number, with country code and no + or spaces.
    #[arg(long, env = "WHATSAPP_NUMBER", default_value = "1234567890")]
    pub whatsapp_number: String,

    /// Greeting prefilled in the WhatsApp chat.
    #[arg(long, env = "WHATSAPP_GREETING", default_value = "Hi! I need help with CityGuardian.")]
    pub whatsapp_greeting: String,

    /// Endpoint of the callback request service. Defaults to this server's
    /// own HTTP API, built from --http-host, --http-port and --enable-tls.
    #[arg(long, env = "CALLBACK_URL")]
    pub callback_url: Option<String>,

    /// Number sent to the callback service when the client does not supply one.
    #[arg(long, env = "CALLBACK_NUMBER", default_value = "+1234567890")]
    pub callback_number: String,

    // --- Telephony Provider Args ---
    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: Option<String>,

    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub twilio_auth_token: Option<String>,

    /// Caller ID used for outbound calls.
    #[arg(long, env = "TWILIO_PHONE_NUMBER")]
    pub twilio_phone_number: Option<String>,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format) for enabling WSS/HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling WSS/HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
