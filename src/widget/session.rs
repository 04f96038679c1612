use super::classifier::reply_for;
use crate::models::chat::{ ChatMessage, Sender, Transcript };
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    Closed,
    OpenIdle,
    OpenAwaitingReply,
}

/// A reply owed to the user. Carries the submitted text so the reply is
/// classified against what was sent, not against whatever the buffer holds
/// when the delay elapses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingReply {
    pub user_text: String,
}

#[derive(Clone, Debug)]
pub struct Submission {
    pub message: ChatMessage,
    pub reply: PendingReply,
}

/// State of one widget instance: visibility, transcript, input buffer and
/// the typing indicator.
#[derive(Clone, Debug)]
pub struct WidgetSession {
    open: bool,
    transcript: Transcript,
    input: String,
    pending_replies: usize,
}

impl WidgetSession {
    pub fn new(initial_greeting: Option<&str>) -> Self {
        let mut transcript = Transcript::new();
        if let Some(greeting) = initial_greeting.filter(|g| !g.trim().is_empty()) {
            transcript.append(Sender::Agent, greeting);
        }
        Self {
            open: false,
            transcript,
            input: String::new(),
            pending_replies: 0,
        }
    }

    pub fn state(&self) -> WidgetState {
        match (self.open, self.pending_replies) {
            (false, _) => WidgetState::Closed,
            (true, 0) => WidgetState::OpenIdle,
            (true, _) => WidgetState::OpenAwaitingReply,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_typing(&self) -> bool {
        self.pending_replies > 0
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns false when the widget was already open.
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.open, true)
    }

    /// Hides the widget. The transcript and any pending replies survive.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn can_send(&self) -> bool {
        self.open && !self.input.trim().is_empty()
    }

    /// Appends the buffer as a user message and clears it. Returns `None`
    /// (and changes nothing) while closed or when the buffer is blank.
    pub fn submit(&mut self) -> Option<Submission> {
        if !self.can_send() {
            return None;
        }
        let text = std::mem::take(&mut self.input);
        let message = self.transcript.append(Sender::User, text.clone());
        self.pending_replies += 1;
        Some(Submission {
            message,
            reply: PendingReply { user_text: text },
        })
    }

    pub fn deliver_reply(&mut self, reply: PendingReply) -> ChatMessage {
        self.pending_replies = self.pending_replies.saturating_sub(1);
        self.transcript.append(Sender::Agent, reply_for(&reply.user_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::classifier::Reply;

    fn opened() -> WidgetSession {
        let mut session = WidgetSession::new(Some("Hi! 👋 How can I help you today?"));
        session.open();
        session
    }

    #[test]
    fn starts_closed_with_greeting() {
        let session = WidgetSession::new(Some("welcome"));
        assert_eq!(session.state(), WidgetState::Closed);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript().messages()[0].sender, Sender::Agent);
        assert!(!session.is_typing());
    }

    #[test]
    fn opening_twice_does_not_duplicate_greeting() {
        let mut session = WidgetSession::new(Some("welcome"));
        assert!(session.open());
        assert!(!session.open());
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.state(), WidgetState::OpenIdle);
    }

    #[test]
    fn blank_input_is_rejected() {
        let mut session = opened();
        for blank in ["", "   ", "\t\n"] {
            session.set_input(blank);
            assert!(!session.can_send());
            assert!(session.submit().is_none());
        }
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.state(), WidgetState::OpenIdle);
    }

    #[test]
    fn submit_appends_user_message_and_awaits_reply() {
        let mut session = opened();
        session.set_input("I want to report a problem");
        let submission = session.submit().expect("non-blank input submits");

        assert_eq!(submission.message.sender, Sender::User);
        assert_eq!(submission.message.text, "I want to report a problem");
        assert_eq!(session.input(), "");
        assert!(session.is_typing());
        assert_eq!(session.state(), WidgetState::OpenAwaitingReply);
        assert_eq!(session.transcript().len(), 2);

        let reply = session.deliver_reply(submission.reply);
        assert_eq!(reply.sender, Sender::Agent);
        assert_eq!(reply.text, Reply::IssueReporting.text());
        assert!(!session.is_typing());
        assert_eq!(session.state(), WidgetState::OpenIdle);
        assert_eq!(session.transcript().len(), 3);
    }

    #[test]
    fn reply_uses_submitted_text_not_current_buffer() {
        let mut session = opened();
        session.set_input("thanks");
        let submission = session.submit().unwrap();
        session.set_input("hello");

        let reply = session.deliver_reply(submission.reply);
        assert_eq!(reply.text, Reply::Acknowledgement.text());
        assert_eq!(session.input(), "hello");
    }

    #[test]
    fn typing_stays_on_until_every_reply_lands() {
        let mut session = opened();
        session.set_input("first");
        let first = session.submit().unwrap();
        session.set_input("second");
        let second = session.submit().unwrap();

        session.deliver_reply(first.reply);
        assert!(session.is_typing());
        session.deliver_reply(second.reply);
        assert!(!session.is_typing());
    }

    #[test]
    fn closed_widget_keeps_transcript_and_accepts_late_reply() {
        let mut session = opened();
        session.set_input("sensor readings?");
        let submission = session.submit().unwrap();
        assert!(session.close());
        assert_eq!(session.state(), WidgetState::Closed);

        session.set_input("ignored while closed");
        assert!(session.submit().is_none());

        session.deliver_reply(submission.reply);
        session.open();
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.state(), WidgetState::OpenIdle);
    }
}
