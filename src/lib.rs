pub mod cli;
pub mod config;
pub mod contact;
pub mod models;
pub mod server;
pub mod telephony;
pub mod widget;

use cli::Args;
use config::{ TelephonyConfig, WidgetConfig };
use contact::CallbackClient;
use log::info;
use server::Server;
use server::api::{ self, AppState };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = WidgetConfig::from_args(&args)?;
    let telephony = TelephonyConfig::from_args(&args);

    info!("--- Widget Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP API Address: {}:{}", args.http_host, args.http_port);
    info!("Reply Delay: {:?}", config.reply_delay);
    info!("Initial Greeting: {}", config.initial_greeting.is_some());
    info!("WhatsApp Link: {}", config.whatsapp.url()?);
    info!("Callback URL: {}", config.callback_url);
    info!("Telephony Credentials: {}", telephony.is_complete());
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let provider = telephony::new_provider(&telephony);
    let http_addr = format!("{}:{}", args.http_host, args.http_port).parse::<SocketAddr>()?;
    let state = AppState { provider, whatsapp: config.whatsapp.clone() };
    api::start_http_server(http_addr, state, &args).await?;

    let callback = Arc::new(CallbackClient::new(&config.callback_url)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, Arc::new(config), callback, args.server_api_key.clone(), args.clone());
    server.run().await?;

    Ok(())
}
