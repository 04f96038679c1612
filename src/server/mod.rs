pub mod api;
pub mod websocket;

use crate::config::WidgetConfig;
use crate::contact::CallbackClient;
use crate::cli::Args;
use self::websocket::handle_connection;
use std::error::Error;
use std::sync::Arc;
use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroU32;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::response::Response as HttpResponse;
use tokio_rustls::TlsAcceptor;
use rustls::ServerConfig;
use rustls::pki_types::{ CertificateDer, PrivateKeyDer };
use rustls_pemfile::{ certs, pkcs8_private_keys };
use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };

use log::{ info, warn, error, debug };

const CONNECTIONS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("connection rate must be non-zero"),
};

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> = RateLimiter::direct(Quota::per_second(CONNECTIONS_PER_SECOND));
}

/// Hosts one widget session per WebSocket connection.
pub struct Server {
    addr: String,
    config: Arc<WidgetConfig>,
    callback: Arc<CallbackClient>,
    api_key: Option<String>,
    args: Args,
}

/// Reads a PEM certificate chain and the first PKCS#8 key into a rustls
/// server config.
fn load_tls_config(
    cert_path: &str,
    key_path: &str
) -> Result<Arc<ServerConfig>, Box<dyn Error + Send + Sync>> {
    let open = |path: &str, what: &str| {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| format!("Failed to open TLS {} file '{}': {}", what, path, e))
    };
    let mut cert_reader = open(cert_path, "certificate")?;
    let mut key_reader = open(key_path, "key")?;

    let cert_chain = certs(&mut cert_reader)
        .collect::<Result<Vec<CertificateDer<'static>>, _>>()
        .map_err(|e| format!("Failed to read certificate(s) from '{}': {}", cert_path, e))?;

    let key = pkcs8_private_keys(&mut key_reader)
        .next()
        .ok_or_else(|| format!("No PKCS8 private key found in '{}'", key_path))?
        .map(PrivateKeyDer::Pkcs8)
        .map_err(|e| format!("Error reading private key from '{}': {}", key_path, e))?;

    let config = ServerConfig::builder_with_provider(
        Arc::new(rustls::crypto::ring::default_provider())
    )
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;

    Ok(Arc::new(config))
}

/// `None` for plain WS. With `--enable-tls` both paths must be set and load.
fn tls_acceptor(args: &Args) -> Result<Option<TlsAcceptor>, Box<dyn Error + Send + Sync>> {
    if !args.enable_tls {
        info!("TLS not enabled. Widget sockets are plain WS.");
        return Ok(None);
    }
    let (Some(cert_path), Some(key_path)) = (&args.tls_cert_path, &args.tls_key_path) else {
        error!("--enable-tls needs both --tls-cert-path and --tls-key-path");
        return Err("Missing TLS certificate or key path".into());
    };
    info!("Widget sockets use TLS: cert '{}', key '{}'", cert_path, key_path);
    Ok(Some(TlsAcceptor::from(load_tls_config(cert_path, key_path)?)))
}

impl Server {
    pub fn new(
        addr: String,
        config: Arc<WidgetConfig>,
        callback: Arc<CallbackClient>,
        api_key: Option<String>,
        args: Args
    ) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Connections are open.");
        }

        Self { addr, config, callback, api_key, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.addr).await?;
        self.serve(listener).await
    }

    /// Accept loop over an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Box<dyn Error + Send + Sync>> {
        let tls_acceptor = tls_acceptor(&self.args)?;
        let protocol = if tls_acceptor.is_some() { "wss" } else { "ws" };
        info!("{} server listening on: {}", protocol.to_uppercase(), listener.local_addr()?);

        loop {
            let (stream, peer) = listener.accept().await?;

            if CONNECTION_LIMITER.check().is_err() {
                warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
                continue;
            }

            info!("Incoming connection from: {}", peer);
            let config = Arc::clone(&self.config);
            let callback = Arc::clone(&self.callback);
            let required_api_key = self.api_key.clone();
            let tls_acceptor_clone = tls_acceptor.clone();

            tokio::spawn(async move {
                let process_result = if let Some(acceptor) = tls_acceptor_clone {
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            info!("TLS handshake successful for {}", peer);
                            Self::process_connection(
                                peer,
                                tls_stream,
                                config,
                                callback,
                                required_api_key
                            ).await
                        }
                        Err(e) => {
                            error!("TLS handshake error for {}: {}", peer, e);
                            Err(Box::new(e) as Box<dyn Error + Send + Sync>)
                        }
                    }
                } else {
                    Self::process_connection(peer, stream, config, callback, required_api_key).await
                };

                if let Err(e) = process_result {
                    error!("Failed to process connection for {}: {}", peer, e);
                }
            });
        }
    }

    async fn process_connection<S>(
        peer: SocketAddr,
        stream: S,
        config: Arc<WidgetConfig>,
        callback: Arc<CallbackClient>,
        required_api_key: Option<String>
    ) -> Result<(), Box<dyn Error + Send + Sync>>
        where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
    {
        let auth_callback = |
            req: &Request,
            response: Response
        | -> Result<Response, HttpResponse<Option<String>>> {
            info!("Handshake from {}", peer);

            let provided = provided_api_key(req);
            debug!("Client provided API key: {}", provided.is_some());

            if let Some(ref required) = required_api_key {
                if provided.as_deref() != Some(required.as_str()) {
                    warn!("{}: bad or missing API key", peer);
                    let mut resp = HttpResponse::new(Some("Unauthorized".to_string()));
                    *resp.status_mut() = StatusCode::UNAUTHORIZED;
                    return Err(resp);
                }
                info!("{} authenticated", peer);
            } else {
                info!("{} no API key required", peer);
            }

            Ok(response)
        };

        match accept_hdr_async(stream, auth_callback).await {
            Ok(ws) => {
                handle_connection(peer, ws, config, callback).await;
                Ok(())
            }
            Err(e) => {
                error!("Handshake failed for {}: {}", peer, e);
                Err(Box::new(e) as _)
            }
        }
    }
}

/// `X-API-Key` header, falling back to the `api_key` query parameter.
fn provided_api_key(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    from_header.or_else(|| {
        req.uri().query().and_then(|q| {
            q.split('&').find_map(|pair| {
                let mut kv = pair.splitn(2, '=');
                match (kv.next(), kv.next()) {
                    (Some("api_key"), value) => Some(value.unwrap_or("").to_string()),
                    _ => None,
                }
            })
        })
    })
}
