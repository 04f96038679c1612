use crate::config::WidgetConfig;
use crate::contact::CallbackClient;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::widget::{ WidgetController, WidgetEvent };
use futures::{ SinkExt, StreamExt };
use futures::stream::SplitSink;
use log::{ info, warn, error, debug };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio_tungstenite::{ tungstenite::protocol::Message, WebSocketStream };
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;

impl From<WidgetEvent> for ServerMessage {
    fn from(event: WidgetEvent) -> Self {
        match event {
            WidgetEvent::Opened { messages, typing } =>
                ServerMessage::Transcript { messages, typing, open: true },
            WidgetEvent::Closed => ServerMessage::Closed,
            WidgetEvent::MessageAppended(message) => ServerMessage::Message { message },
            WidgetEvent::Typing(active) => ServerMessage::Typing { active },
            WidgetEvent::OpenUrl { url, target } => ServerMessage::OpenUrl { url, target },
            WidgetEvent::Notice(message) => ServerMessage::Notice { message },
        }
    }
}

async fn send_frame<S>(
    tx: &mut WsSink<S>,
    frame: &ServerMessage
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin
{
    let json = serde_json::to_string(frame)?;
    tx.send(Message::Text(json)).await?;
    Ok(())
}

async fn apply(widget: &mut WidgetController, message: ClientMessage) -> Option<ServerMessage> {
    match message {
        ClientMessage::Open => widget.open().await,
        ClientMessage::Close => widget.close().await,
        ClientMessage::Input { text } => widget.set_input(text).await,
        ClientMessage::Send => {
            widget.send().await;
        }
        ClientMessage::Chat { content } => {
            widget.chat(content).await;
        }
        ClientMessage::WhatsApp => {
            if let Err(e) = widget.open_whatsapp() {
                error!("Failed to build WhatsApp link: {}", e);
                return Some(ServerMessage::Error {
                    message: "WhatsApp link unavailable".to_string(),
                });
            }
        }
        ClientMessage::CallMe { to } => widget.request_call(to),
    }
    None
}

/// Runs one widget session for the lifetime of the socket. The controller
/// is dropped on disconnect, which aborts any reply or call still pending.
pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    config: Arc<WidgetConfig>,
    callback: Arc<CallbackClient>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);

    let (mut tx, mut rx) = websocket.split();
    let session_id = Uuid::new_v4();
    info!("Assigned widget session {} to {}", session_id, peer);

    let (mut widget, mut events) = WidgetController::new(config, callback);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Err(e) = send_frame(&mut tx, &ServerMessage::from(event)).await {
                    error!("Error sending widget event to {}: {}", peer, e);
                    break;
                }
            }
            incoming = rx.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        match e {
                            | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                            | tokio_tungstenite::tungstenite::Error::Protocol(_)
                            | tokio_tungstenite::tungstenite::Error::Utf8 => {
                                info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                            }
                            tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                                io_err.kind() == std::io::ErrorKind::ConnectionReset
                            => {
                                info!("WebSocket connection reset by peer {}", peer);
                            }
                            tokio_tungstenite::tungstenite::Error::Capacity(ref cap_err) => {
                                error!("WebSocket capacity error for {}: {}", peer, cap_err);
                                let frame = ServerMessage::Error {
                                    message: "Server capacity error".to_string(),
                                };
                                let _ = send_frame(&mut tx, &frame).await;
                            }
                            _ => {
                                error!("Error receiving message from {}: {}", peer, e);
                            }
                        }
                        break;
                    }
                    None => break,
                };

                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let frame = ServerMessage::Error { message: "Message too large".to_string() };
                    if send_frame(&mut tx, &frame).await.is_err() {
                        error!("Failed to send size limit error to {}", peer);
                    }
                    break;
                }

                match message {
                    Message::Text(text) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_message) => {
                                debug!("{} -> {:?}", peer, client_message);
                                apply(&mut widget, client_message).await
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                Some(ServerMessage::Error {
                                    message: format!("Failed to parse message: {}", e),
                                })
                            }
                        };
                        if let Some(frame) = reply {
                            if let Err(e) = send_frame(&mut tx, &frame).await {
                                error!("Error sending error message to {}: {}", peer, e);
                                break;
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Frame(_) => {}
                }
            }
        }
    }

    drop(widget);
    info!("WebSocket connection closed for {} (session {})", peer, session_id);
}
