use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::reply::{ReplyError, ReplyService};

/// Shown in place of a reply when the service fails.
pub const FALLBACK_REPLY: &str = "Sorry, I can't respond right now.";

/// The three messages appended after the widget opens, in order.
const INTRO_MESSAGES: [(&str, Option<StyleHint>); 3] = [
    ("No personal data is stored in this chat.", Some(StyleHint::Notice)),
    (
        "Appointment requests for treatments and cosmetics are possible here.",
        Some(StyleHint::Confirm),
    ),
    ("How can I help you today?", None),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// Presentation-only tint for bot bubbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleHint {
    Notice,
    Confirm,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub style: Option<StyleHint>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            style: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            style: None,
        }
    }

    pub fn bot_styled(text: impl Into<String>, style: StyleHint) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            style: Some(style),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Closed,
    Open,
}

/// Completion events produced by the widget's spawned tasks. All state
/// changes they imply happen in [`ChatWidget::apply`], on the event loop.
#[derive(Debug)]
pub enum WidgetEvent {
    Intro { message: Message, last: bool },
    Reply(Result<String, ReplyError>),
}

/// Cosmetic pacing delays. Not protocol timeouts.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Delay between opening the widget and the first intro message.
    pub open_delay: Duration,
    /// Delay between consecutive intro messages.
    pub intro_gap: Duration,
    /// Delay before a successful reply is shown.
    pub reply_delay: Duration,
    /// Interval of the tick event driving the typing-indicator ellipsis.
    pub tick: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            open_delay: Duration::from_millis(300),
            intro_gap: Duration::from_millis(500),
            reply_delay: Duration::from_millis(500),
            tick: Duration::from_millis(300),
        }
    }
}

/// The chat widget: visibility state, the append-only message log, the
/// input line, and the send pipeline. The reply service and the event
/// channel are injected at construction; the widget owns no globals.
pub struct ChatWidget {
    pub state: WidgetState,
    pub messages: Vec<Message>,
    pub input: String,
    pub cursor: usize,
    pub typing: bool,
    pub scroll: u16,
    /// Inner size of the log area, updated during render for scroll math.
    pub log_height: u16,
    pub log_width: u16,
    /// 0-2, drives the typing-indicator ellipsis.
    pub animation_frame: u8,

    service: Arc<dyn ReplyService>,
    pacing: Pacing,
    events_tx: mpsc::UnboundedSender<WidgetEvent>,
    pending: Option<JoinHandle<()>>,
    intro_pending: bool,
}

impl ChatWidget {
    pub fn new(
        service: Arc<dyn ReplyService>,
        pacing: Pacing,
        events_tx: mpsc::UnboundedSender<WidgetEvent>,
    ) -> Self {
        Self {
            state: WidgetState::Closed,
            messages: Vec::new(),
            input: String::new(),
            cursor: 0,
            typing: false,
            scroll: 0,
            log_height: 0,
            log_width: 0,
            animation_frame: 0,
            service,
            pacing,
            events_tx,
            pending: None,
            intro_pending: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == WidgetState::Open
    }

    /// Closed -> Open. Schedules the intro sequence unless one is already
    /// in flight; opening an open widget is a no-op.
    pub fn open(&mut self) {
        if self.state == WidgetState::Open {
            return;
        }
        self.state = WidgetState::Open;
        debug!("chat widget opened");

        if self.intro_pending {
            return;
        }
        self.intro_pending = true;

        let tx = self.events_tx.clone();
        let pacing = self.pacing;
        tokio::spawn(async move {
            tokio::time::sleep(pacing.open_delay).await;
            let total = INTRO_MESSAGES.len();
            for (i, (text, style)) in INTRO_MESSAGES.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(pacing.intro_gap).await;
                }
                let message = match style {
                    Some(hint) => Message::bot_styled(*text, *hint),
                    None => Message::bot(*text),
                };
                let event = WidgetEvent::Intro {
                    message,
                    last: i + 1 == total,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
    }

    /// Open -> Closed. The message log is retained; a pending intro
    /// sequence or reply keeps appending to the hidden log.
    pub fn close(&mut self) {
        if self.state == WidgetState::Closed {
            return;
        }
        self.state = WidgetState::Closed;
        debug!("chat widget closed");
    }

    /// Send the current input to the reply service. Whitespace-only input
    /// is a no-op, as is submitting while a reply is already pending.
    pub fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.pending.is_some() {
            debug!("submit ignored, reply already pending");
            return;
        }

        self.messages.push(Message::user(text.clone()));
        self.input.clear();
        self.cursor = 0;
        self.typing = true;
        self.scroll_to_bottom();

        let service = self.service.clone();
        let tx = self.events_tx.clone();
        let reply_delay = self.pacing.reply_delay;
        self.pending = Some(tokio::spawn(async move {
            let result = service.reply(&text).await;
            if result.is_ok() {
                tokio::time::sleep(reply_delay).await;
            }
            let _ = tx.send(WidgetEvent::Reply(result));
        }));
    }

    /// Apply a completion event from a spawned task.
    pub fn apply(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Intro { message, last } => {
                self.messages.push(message);
                if last {
                    self.intro_pending = false;
                }
            }
            WidgetEvent::Reply(result) => {
                self.pending = None;
                self.typing = false;
                match result {
                    Ok(text) => self.messages.push(Message::bot(text)),
                    Err(e) => {
                        warn!(error = %e, "reply service failed");
                        self.messages.push(Message::bot(FALLBACK_REPLY));
                    }
                }
            }
        }
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.typing {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing, UTF-8 safe via char indices.

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1).min(self.max_scroll());
    }

    /// Pin the log view to the newest entry.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let total = self.rendered_line_count();
        let visible = if self.log_height > 0 {
            self.log_height
        } else {
            20
        };
        total.saturating_sub(visible)
    }

    /// Total rendered log lines at the current width. Must mirror the
    /// layout produced by `ui::log_lines`.
    fn rendered_line_count(&self) -> u16 {
        let wrap_width = if self.log_width > 0 {
            self.log_width as usize
        } else {
            40
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // marker line
            for line in msg.text.lines() {
                total += wrapped_height(line, wrap_width);
            }
            total += 1; // blank line after message
        }
        if self.typing {
            total += 2; // marker + animated dots
        }
        total
    }
}

/// Greedy word-wrap row count for one line at the given width. An
/// estimate of the renderer's word wrapping, not a pixel-perfect mirror;
/// counting whole words keeps the newest entry in view where a plain
/// character count undercuts it.
fn wrapped_height(line: &str, width: usize) -> u16 {
    let mut rows: u16 = 0;
    let mut used: usize = 0;
    for word in line.split_whitespace() {
        let mut len = word.chars().count();
        // Words wider than the log break mid-word
        while len > width {
            rows += 1;
            len -= width;
            used = 0;
        }
        if len == 0 {
            continue;
        }
        if used == 0 {
            rows += 1;
            used = len;
        } else if used + 1 + len <= width {
            used += 1 + len;
        } else {
            rows += 1;
            used = len;
        }
    }
    rows.max(1)
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedReply(&'static str);

    #[async_trait]
    impl ReplyService for FixedReply {
        async fn reply(&self, _message: &str) -> Result<String, ReplyError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingReply;

    #[async_trait]
    impl ReplyService for FailingReply {
        async fn reply(&self, _message: &str) -> Result<String, ReplyError> {
            Err(ReplyError::Body("garbage".to_string()))
        }
    }

    fn widget_with(
        service: Arc<dyn ReplyService>,
    ) -> (ChatWidget, mpsc::UnboundedReceiver<WidgetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChatWidget::new(service, Pacing::default(), tx), rx)
    }

    fn type_text(widget: &mut ChatWidget, text: &str) {
        for c in text.chars() {
            widget.insert_char(c);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_input_is_a_no_op() {
        let (mut widget, mut rx) = widget_with(Arc::new(FixedReply("hi")));
        widget.open();
        type_text(&mut widget, "   ");
        widget.submit();

        assert!(widget.messages.is_empty());
        assert!(!widget.typing);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_appends_user_then_bot_message() {
        let (mut widget, mut rx) = widget_with(Arc::new(FixedReply("Hi there")));
        type_text(&mut widget, "Hello");
        widget.submit();

        assert_eq!(widget.messages.len(), 1);
        assert_eq!(widget.messages[0].sender, Sender::User);
        assert_eq!(widget.messages[0].text, "Hello");
        assert!(widget.input.is_empty());
        assert!(widget.typing);

        let event = rx.recv().await.unwrap();
        widget.apply(event);

        assert_eq!(widget.messages.len(), 2);
        assert_eq!(widget.messages[1].sender, Sender::Bot);
        assert_eq!(widget.messages[1].text, "Hi there");
        assert!(!widget.typing);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reply_shows_fallback() {
        let (mut widget, mut rx) = widget_with(Arc::new(FailingReply));
        type_text(&mut widget, "Hello");
        widget.submit();

        let event = rx.recv().await.unwrap();
        widget.apply(event);

        assert_eq!(widget.messages.len(), 2);
        assert_eq!(widget.messages[1].text, FALLBACK_REPLY);
        assert!(!widget.typing);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_while_pending_is_ignored() {
        let (mut widget, mut rx) = widget_with(Arc::new(FixedReply("hi")));
        type_text(&mut widget, "first");
        widget.submit();
        type_text(&mut widget, "second");
        widget.submit();

        // Only the first user message made it into the log
        assert_eq!(widget.messages.len(), 1);
        assert_eq!(widget.messages[0].text, "first");
        assert_eq!(widget.input, "second");

        widget.apply(rx.recv().await.unwrap());
        assert_eq!(widget.messages.len(), 2);
        // Exactly one reply event was produced
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn opening_appends_three_intro_messages_in_order() {
        let (mut widget, mut rx) = widget_with(Arc::new(FixedReply("hi")));
        assert!(!widget.is_open());
        widget.open();
        assert!(widget.is_open());

        for _ in 0..3 {
            let event = rx.recv().await.unwrap();
            widget.apply(event);
        }

        assert_eq!(widget.messages.len(), 3);
        assert!(widget.messages.iter().all(|m| m.sender == Sender::Bot));
        assert_eq!(widget.messages[0].style, Some(StyleHint::Notice));
        assert_eq!(widget.messages[1].style, Some(StyleHint::Confirm));
        assert_eq!(widget.messages[2].style, None);
        assert_eq!(widget.messages[2].text, "How can I help you today?");
    }

    #[tokio::test(start_paused = true)]
    async fn opening_an_open_widget_is_a_no_op() {
        let (mut widget, mut rx) = widget_with(Arc::new(FixedReply("hi")));
        widget.open();
        widget.open();

        for _ in 0..3 {
            widget.apply(rx.recv().await.unwrap());
        }
        assert_eq!(widget.messages.len(), 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_during_intro_does_not_schedule_a_second_sequence() {
        let (mut widget, mut rx) = widget_with(Arc::new(FixedReply("hi")));
        widget.open();
        widget.close();
        widget.open();

        for _ in 0..3 {
            widget.apply(rx.recv().await.unwrap());
        }
        assert_eq!(widget.messages.len(), 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn closing_retains_the_log() {
        let (mut widget, mut rx) = widget_with(Arc::new(FixedReply("hi")));
        widget.open();
        for _ in 0..3 {
            widget.apply(rx.recv().await.unwrap());
        }

        widget.close();
        assert!(!widget.is_open());
        assert_eq!(widget.messages.len(), 3);
    }

    #[test]
    fn wrapped_height_counts_whole_words() {
        assert_eq!(wrapped_height("", 10), 1);
        assert_eq!(wrapped_height("aaaa bbbb", 10), 1);
        // Three 6-char words at width 10: one word per row
        assert_eq!(wrapped_height("aaaaaa bbbbbb cccccc", 10), 3);
        // Oversized words break mid-word
        assert_eq!(wrapped_height(&"x".repeat(25), 10), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_reaches_the_newest_entry_on_narrow_widths() {
        let (mut widget, _rx) = widget_with(Arc::new(FixedReply("hi")));
        widget.log_width = 10;
        widget.log_height = 3;
        widget.messages.push(Message::bot("aaaaaa bbbbbb cccccc"));
        widget.scroll_to_bottom();
        // marker + three wrapped rows + trailing blank, three visible
        assert_eq!(widget.scroll, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cursor_editing_is_utf8_safe() {
        let (mut widget, _rx) = widget_with(Arc::new(FixedReply("hi")));
        type_text(&mut widget, "grüße");
        widget.cursor_left();
        widget.backspace();
        assert_eq!(widget.input, "grüe");
        widget.cursor_home();
        widget.delete();
        assert_eq!(widget.input, "rüe");
    }
}
