use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// A single transcript entry. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

/// Append-only, insertion-ordered list of messages owned by one widget session.
#[derive(Clone, Debug)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self { messages: Vec::new(), next_id: 1 }
    }

    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage {
            id: self.next_id,
            text: text.into(),
            sender,
            timestamp: self.next_timestamp(),
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    // Wall clocks can step backwards; clamp so positions and timestamps agree.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.messages.last() {
            Some(prev) if prev.timestamp > now => prev.timestamp,
            _ => now,
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
