use super::chat::ChatMessage;
use serde::{ Serialize, Deserialize };

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "close")]
    Close,
    #[serde(rename = "input")] Input {
        text: String,
    },
    #[serde(rename = "send")]
    Send,
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "whatsapp")]
    WhatsApp,
    #[serde(rename = "call_me")] CallMe {
        #[serde(default)]
        to: Option<String>,
    },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "transcript")] Transcript {
        messages: Vec<ChatMessage>,
        typing: bool,
        open: bool,
    },
    #[serde(rename = "message")] Message {
        message: ChatMessage,
    },
    #[serde(rename = "typing")] Typing {
        active: bool,
    },
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "open_url")] OpenUrl {
        url: String,
        target: String,
    },
    #[serde(rename = "notice")] Notice {
        message: String,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
}
