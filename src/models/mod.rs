pub mod callback;
pub mod chat;
pub mod websocket;
