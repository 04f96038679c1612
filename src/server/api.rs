use crate::cli::Args;
use crate::contact::WhatsAppLink;
use crate::models::callback::{
    CallbackFailure,
    CallbackRequest,
    CallbackStatus,
    CALL_FAILED,
    CALL_INITIATED,
    NOT_CONFIGURED,
    PHONE_REQUIRED,
};
use crate::telephony::{ CallProvider, ProviderOutcome };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    routing::{ get, post },
    Router,
    extract::State,
    response::{ IntoResponse, Response },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error };

pub use crate::models::callback::CALLBACK_PATH;
pub const WHATSAPP_PATH: &str = "/api/contact/whatsapp";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CallProvider>,
    pub whatsapp: WhatsAppLink,
}

#[derive(Serialize)]
struct DeepLinkResponse {
    url: String,
    greeting: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider: &'static str,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(CALLBACK_PATH, post(callback_handler))
        .route(WHATSAPP_PATH, get(whatsapp_link_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: SocketAddr,
    state: AppState,
    args: &Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Starting HTTP API server on: http://{}", addr);
    let app = router(state);

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => return Err("TLS enabled without cert/key".into()),
        };

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        tokio::spawn(async move {
            let result = axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await;

            if let Err(e) = result {
                error!("HTTPS server error: {}", e);
            }
        });

        info!("HTTPS server started with TLS enabled");
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
        })?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                error!("HTTP server error: {}", e);
            }
        });

        info!("HTTP server started");
    }

    Ok(())
}

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(CallbackFailure { error: error.to_string() })).into_response()
}

/// `POST /api/twilio/call` with `{ "to": "<number>" }`.
async fn callback_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request: CallbackRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            error!("Callback API error: unreadable request body: {}", e);
            return failure(StatusCode::INTERNAL_SERVER_ERROR, CALL_FAILED);
        }
    };

    let Some(to) = request.destination() else {
        warn!("Callback request rejected: missing phone number");
        return failure(StatusCode::BAD_REQUEST, PHONE_REQUIRED);
    };

    match state.provider.place_call(to).await {
        Ok(ProviderOutcome::Initiated { call_sid }) => {
            info!("Call {} initiated via {}", call_sid, state.provider.name());
            (StatusCode::OK, Json(CallbackStatus {
                success: true,
                call_sid: Some(call_sid),
                message: CALL_INITIATED.into(),
            })).into_response()
        }
        Ok(ProviderOutcome::NotConfigured) => {
            (StatusCode::NOT_IMPLEMENTED, Json(CallbackStatus {
                success: false,
                call_sid: None,
                message: NOT_CONFIGURED.into(),
            })).into_response()
        }
        Err(e) => {
            error!("Callback API error: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, CALL_FAILED)
        }
    }
}

async fn whatsapp_link_handler(State(state): State<AppState>) -> Response {
    match state.whatsapp.url() {
        Ok(url) => Json(DeepLinkResponse {
            url: url.to_string(),
            greeting: state.whatsapp.greeting().to_string(),
        }).into_response(),
        Err(e) => {
            error!("Failed to build WhatsApp link: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse { status: "ok", provider: state.provider.name() })
}
