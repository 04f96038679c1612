//! # Chat Widget Controller
//!
//! Owns one [`WidgetSession`] and drives it from host actions (open, close,
//! type, send, quick-contact shortcuts). Anything the host must render is
//! pushed through an event channel: appended messages, typing changes,
//! deep links to open and call notices.
//!
//! Deferred replies are delivered by one worker task per controller, in
//! submission order. Callback requests run as their own tasks. Closing the
//! widget leaves both running so a reply can land while the panel is hidden;
//! dropping the controller aborts whatever is still outstanding.

pub mod classifier;
pub mod session;

use crate::config::WidgetConfig;
use crate::contact::{ CallbackClient, LinkOpener };
use crate::models::chat::ChatMessage;
use log::{ debug, info, warn };
use std::sync::Arc;
use tokio::sync::mpsc::{ self, UnboundedReceiver, UnboundedSender };
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use url::Url;

pub use session::{ PendingReply, Submission, WidgetSession, WidgetState };

#[derive(Clone, Debug, PartialEq)]
pub enum WidgetEvent {
    Opened {
        messages: Vec<ChatMessage>,
        typing: bool,
    },
    Closed,
    MessageAppended(ChatMessage),
    Typing(bool),
    OpenUrl {
        url: String,
        target: String,
    },
    Notice(String),
}

/// Delivers open requests to the host as [`WidgetEvent::OpenUrl`].
pub struct EventOpener {
    events: UnboundedSender<WidgetEvent>,
}

impl EventOpener {
    pub fn new(events: UnboundedSender<WidgetEvent>) -> Self {
        Self { events }
    }
}

impl LinkOpener for EventOpener {
    fn open(&self, url: &Url, target: &str) {
        let event = WidgetEvent::OpenUrl { url: url.to_string(), target: target.to_string() };
        if self.events.send(event).is_err() {
            debug!("Host gone before deep link could be opened");
        }
    }
}

pub struct WidgetController {
    session: Arc<Mutex<WidgetSession>>,
    config: Arc<WidgetConfig>,
    callback: Arc<CallbackClient>,
    opener: Arc<dyn LinkOpener>,
    events: UnboundedSender<WidgetEvent>,
    reply_queue: Option<UnboundedSender<(Instant, PendingReply)>>,
    tasks: Vec<AbortHandle>,
}

impl WidgetController {
    pub fn new(
        config: Arc<WidgetConfig>,
        callback: Arc<CallbackClient>
    ) -> (Self, UnboundedReceiver<WidgetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let opener = Arc::new(EventOpener::new(tx.clone()));
        (Self::with_opener(config, callback, opener, tx), rx)
    }

    pub fn with_opener(
        config: Arc<WidgetConfig>,
        callback: Arc<CallbackClient>,
        opener: Arc<dyn LinkOpener>,
        events: UnboundedSender<WidgetEvent>
    ) -> Self {
        let session = WidgetSession::new(config.initial_greeting.as_deref());
        Self {
            session: Arc::new(Mutex::new(session)),
            config,
            callback,
            opener,
            events,
            reply_queue: None,
            tasks: Vec::new(),
        }
    }

    pub async fn open(&self) {
        let mut session = self.session.lock().await;
        if session.open() {
            info!("Widget opened");
        }
        self.emit(WidgetEvent::Opened {
            messages: session.transcript().messages().to_vec(),
            typing: session.is_typing(),
        });
    }

    pub async fn close(&self) {
        if self.session.lock().await.close() {
            info!("Widget closed");
            self.emit(WidgetEvent::Closed);
        }
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.session.lock().await.set_input(text);
    }

    pub async fn can_send(&self) -> bool {
        self.session.lock().await.can_send()
    }

    /// Submits the input buffer. Returns false when nothing was sent.
    pub async fn send(&mut self) -> bool {
        let submission = {
            let mut session = self.session.lock().await;
            match session.submit() {
                Some(submission) => submission,
                None => {
                    debug!("Ignoring submission: widget closed or input blank");
                    return false;
                }
            }
        };

        self.emit(WidgetEvent::MessageAppended(submission.message));
        self.emit(WidgetEvent::Typing(true));
        self.schedule_reply(submission.reply);
        true
    }

    pub async fn chat(&mut self, content: impl Into<String>) -> bool {
        self.set_input(content).await;
        self.send().await
    }

    pub fn open_whatsapp(&self) -> Result<(), url::ParseError> {
        self.config.whatsapp.open_with(self.opener.as_ref())
    }

    /// Asks the callback service to phone `to` (or the configured default)
    /// and reports the result as a notice. Never fails.
    pub fn request_call(&mut self, to: Option<String>) {
        let to = to
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.config.callback_number.clone());
        let client = Arc::clone(&self.callback);
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            let notice = client.notify(&to).await;
            send_event(&events, WidgetEvent::Notice(notice.text().to_string()));
        });
        self.track(handle.abort_handle());
    }

    pub async fn state(&self) -> WidgetState {
        self.session.lock().await.state()
    }

    pub async fn is_typing(&self) -> bool {
        self.session.lock().await.is_typing()
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.session.lock().await.transcript().messages().to_vec()
    }

    /// Background tasks still alive: the reply worker once started, plus
    /// any callback request in flight.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.iter().filter(|h| !h.is_finished()).count()
    }

    /// Queues the reply for the session's reply worker. Deadlines are taken
    /// at submission and the worker drains the queue in order, so replies
    /// land in the order their messages were sent.
    fn schedule_reply(&mut self, reply: PendingReply) {
        let deadline = Instant::now() + self.config.reply_delay;
        let queue = match &self.reply_queue {
            Some(queue) if !queue.is_closed() => queue.clone(),
            _ => self.spawn_reply_worker(),
        };
        if queue.send((deadline, reply)).is_err() {
            warn!("Reply worker stopped; reply dropped");
        }
    }

    fn spawn_reply_worker(&mut self) -> UnboundedSender<(Instant, PendingReply)> {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Instant, PendingReply)>();
        let session = Arc::clone(&self.session);
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            while let Some((deadline, reply)) = rx.recv().await {
                tokio::time::sleep_until(deadline).await;
                let (message, typing) = {
                    let mut session = session.lock().await;
                    let message = session.deliver_reply(reply);
                    (message, session.is_typing())
                };
                send_event(&events, WidgetEvent::MessageAppended(message));
                send_event(&events, WidgetEvent::Typing(typing));
            }
        });
        self.track(handle.abort_handle());
        self.reply_queue = Some(tx.clone());
        tx
    }

    fn track(&mut self, handle: AbortHandle) {
        self.tasks.retain(|h| !h.is_finished());
        self.tasks.push(handle);
    }

    fn emit(&self, event: WidgetEvent) {
        send_event(&self.events, event);
    }
}

fn send_event(events: &UnboundedSender<WidgetEvent>, event: WidgetEvent) {
    if events.send(event).is_err() {
        warn!("Widget event dropped: host receiver closed");
    }
}

impl Drop for WidgetController {
    fn drop(&mut self) {
        let outstanding = self.pending_tasks();
        if outstanding > 0 {
            debug!("Aborting {} outstanding widget task(s)", outstanding);
        }
        for handle in self.tasks.drain(..) {
            handle.abort();
        }
    }
}
