//! Callback client against the real HTTP route on an ephemeral port.

use std::sync::Arc;
use support_widget::contact::{ CallbackClient, CallbackOutcome, Notice };
use support_widget::models::callback::{ CALL_INITIATED, NOT_CONFIGURED, PHONE_REQUIRED };
use support_widget::server::api::{ router, AppState, CALLBACK_PATH };
use support_widget::telephony::UnconfiguredProvider;
use support_widget::contact::WhatsAppLink;

async fn spawn_api() -> String {
    let state = AppState {
        provider: Arc::new(UnconfiguredProvider::new(false)),
        whatsapp: WhatsAppLink::new("wa.me", "1234567890", "Hi!"),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}{}", addr, CALLBACK_PATH)
}

#[tokio::test]
async fn placeholder_server_reports_not_configured() {
    let client = CallbackClient::new(&spawn_api().await).unwrap();

    let outcome = client.request_callback("+15551234567").await.unwrap();
    assert_eq!(outcome, CallbackOutcome::NotConfigured { message: NOT_CONFIGURED.to_string() });
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn empty_number_is_rejected_with_validation_error() {
    let client = CallbackClient::new(&spawn_api().await).unwrap();

    let outcome = client.request_callback("").await.unwrap();
    assert_eq!(outcome, CallbackOutcome::Rejected {
        status: 400,
        error: PHONE_REQUIRED.to_string(),
    });
}

#[tokio::test]
async fn notices_for_each_failure_class() {
    let client = CallbackClient::new(&spawn_api().await).unwrap();
    assert_eq!(client.notify("+15551234567").await, Notice::CallUnavailable);
    assert_eq!(client.notify("").await, Notice::CallUnavailable);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);
    let offline = CallbackClient::new(&format!("http://{}{}", dead, CALLBACK_PATH)).unwrap();
    assert_eq!(offline.notify("+15551234567").await, Notice::CallError);
}

/// Serves `app` on an ephemeral port and returns a client for its callback route.
async fn client_for(app: axum::Router) -> CallbackClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    CallbackClient::new(&format!("http://{}{}", addr, CALLBACK_PATH)).unwrap()
}

#[tokio::test]
async fn non_json_response_is_transport_class_failure() {
    let client = client_for(
        axum::Router::new().route(
            CALLBACK_PATH,
            axum::routing::post(|| async { "<html>ok</html>" })
        )
    ).await;
    assert!(client.request_callback("+15551234567").await.is_err());
    assert_eq!(client.notify("+15551234567").await, Notice::CallError);
}

#[tokio::test]
async fn any_2xx_counts_as_scheduled() {
    use axum::http::StatusCode;

    let no_content = client_for(
        axum::Router::new().route(
            CALLBACK_PATH,
            axum::routing::post(|| async { StatusCode::NO_CONTENT })
        )
    ).await;
    assert_eq!(
        no_content.request_callback("+15551234567").await.unwrap(),
        CallbackOutcome::Initiated { call_sid: None, message: CALL_INITIATED.to_string() }
    );
    assert_eq!(no_content.notify("+15551234567").await, Notice::CallScheduled);

    let created = client_for(
        axum::Router::new().route(
            CALLBACK_PATH,
            axum::routing::post(|| async {
                (
                    StatusCode::CREATED,
                    axum::Json(
                        serde_json::json!({ "success": true, "callSid": "CA7", "message": "queued" })
                    ),
                )
            })
        )
    ).await;
    assert_eq!(
        created.request_callback("+15551234567").await.unwrap(),
        CallbackOutcome::Initiated { call_sid: Some("CA7".into()), message: "queued".into() }
    );
    assert_eq!(created.notify("+15551234567").await, Notice::CallScheduled);
}

#[tokio::test]
async fn explicit_failure_in_2xx_body_is_rejected() {
    let client = client_for(
        axum::Router::new().route(
            CALLBACK_PATH,
            axum::routing::post(|| async {
                axum::Json(serde_json::json!({ "success": false, "message": "line busy" }))
            })
        )
    ).await;
    assert_eq!(
        client.request_callback("+15551234567").await.unwrap(),
        CallbackOutcome::Rejected { status: 200, error: "line busy".into() }
    );
    assert_eq!(client.notify("+15551234567").await, Notice::CallUnavailable);
}
