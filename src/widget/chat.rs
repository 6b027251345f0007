//! The chat widget: message list, typing indicator and one request per submit.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::clock::{Clock, TokioClock};
use super::message::{Message, Sender};
use super::view::ChatView;
use crate::client::ChatTransport;
use crate::types::ChatRequest;

/// Greeting shown by [`ChatWidget::initialize`] unless overridden.
pub const DEFAULT_GREETING: &str =
    "Hi! I am UniBot 🤖. Ask me anything about admissions, fees, courses, placements or events.";

/// Bot message shown when a request fails for any reason.
pub const FALLBACK_REPLY: &str =
    "Sorry, something went wrong while processing your request. Please try again.";

/// Shortest time between submitting and seeing the reply.
pub const MIN_REPLY_DELAY: Duration = Duration::from_millis(1000);

/// Where the widget is in its request cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WidgetPhase {
    /// Ready for input.
    #[default]
    Idle,
    /// Request in flight.
    Sending,
    /// Reply received, holding it back until the minimum delay has passed.
    Delaying,
}

/// What a call to [`ChatWidget::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was blank; nothing was appended or sent.
    Ignored,
    /// Another submission is still pending; nothing was appended or sent.
    Busy,
    /// The server replied and the reply was rendered.
    Replied {
        /// Whether the reply carried the escalation annotation.
        escalated: bool,
    },
    /// The request failed and the fallback message was rendered.
    Failed,
}

#[derive(Debug)]
struct WidgetState<V> {
    view: V,
    messages: Vec<Message>,
    phase: WidgetPhase,
    typing: bool,
    initialized: bool,
}

impl<V: ChatView> WidgetState<V> {
    fn append(&mut self, message: Message) {
        self.view.append_row(&message);
        self.messages.push(message);
        self.view.scroll_to_bottom();
    }

    fn show_typing(&mut self) {
        if self.typing {
            return;
        }
        self.typing = true;
        self.view.show_typing();
        self.view.scroll_to_bottom();
    }

    fn hide_typing(&mut self) {
        if !self.typing {
            return;
        }
        self.typing = false;
        self.view.hide_typing();
        self.view.scroll_to_bottom();
    }
}

fn lock<V>(state: &Mutex<WidgetState<V>>) -> MutexGuard<'_, WidgetState<V>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the widget to `Idle` when a submission ends, including when
/// the submitting future is dropped mid-flight.
struct PendingGuard<'a, V: ChatView> {
    state: &'a Mutex<WidgetState<V>>,
}

impl<V: ChatView> Drop for PendingGuard<'_, V> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        state.hide_typing();
        state.phase = WidgetPhase::Idle;
        state.view.set_input_enabled(true);
    }
}

/// A chat widget bound to its own view, transport and clock.
///
/// Only one submission is pending at a time. While it is, the view's
/// input is disabled and further submits return [`SubmitOutcome::Busy`].
///
/// # Example
///
/// ```rust,no_run
/// use unibot::client::HttpTransport;
/// use unibot::widget::{ChatWidget, Transcript};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new("http://localhost:3000/api/chat")?;
/// let widget = ChatWidget::new(transport, Transcript::new());
/// widget.initialize();
/// widget.submit("How do I apply?").await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChatWidget<T, V, C = TokioClock> {
    transport: T,
    clock: C,
    min_reply_delay: Duration,
    greeting: String,
    state: Mutex<WidgetState<V>>,
}

impl<T, V> ChatWidget<T, V>
where
    T: ChatTransport,
    V: ChatView,
{
    /// Create a widget that renders into `view` and sends through `transport`.
    pub fn new(transport: T, view: V) -> Self {
        Self {
            transport,
            clock: TokioClock,
            min_reply_delay: MIN_REPLY_DELAY,
            greeting: DEFAULT_GREETING.to_string(),
            state: Mutex::new(WidgetState {
                view,
                messages: Vec::new(),
                phase: WidgetPhase::Idle,
                typing: false,
                initialized: false,
            }),
        }
    }
}

impl<T, V, C> ChatWidget<T, V, C>
where
    T: ChatTransport,
    V: ChatView,
    C: Clock,
{
    /// Replace the clock used for the minimum reply delay.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ChatWidget<T, V, C2> {
        ChatWidget {
            transport: self.transport,
            clock,
            min_reply_delay: self.min_reply_delay,
            greeting: self.greeting,
            state: self.state,
        }
    }

    #[must_use]
    pub fn with_min_reply_delay(mut self, delay: Duration) -> Self {
        self.min_reply_delay = delay;
        self
    }

    #[must_use]
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, WidgetState<V>> {
        lock(&self.state)
    }

    /// Render the greeting. Only the first call has an effect.
    pub fn initialize(&self) {
        let mut state = self.state();
        if state.initialized {
            return;
        }
        state.initialized = true;
        state.append(Message::bot(self.greeting.clone()));
    }

    /// Send `text` to the chat endpoint and render the reply.
    ///
    /// The text is trimmed first; blank input is ignored. The reply is
    /// never rendered sooner than the minimum reply delay after the
    /// request started. Failures render [`FALLBACK_REPLY`] instead.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        {
            let mut state = self.state();
            if state.phase != WidgetPhase::Idle {
                debug!(phase = ?state.phase, "Submit rejected while a request is pending");
                return SubmitOutcome::Busy;
            }
            state.phase = WidgetPhase::Sending;
            state.append(Message::user(message));
            state.view.clear_input();
            state.view.set_input_enabled(false);
            state.show_typing();
        }
        let guard = PendingGuard { state: &self.state };

        let started = self.clock.now();
        let outcome = match self.transport.send(&ChatRequest::new(message)).await {
            Ok(reply) => {
                let elapsed = self.clock.now().saturating_duration_since(started);
                let remaining = self.min_reply_delay.saturating_sub(elapsed);
                if !remaining.is_zero() {
                    self.state().phase = WidgetPhase::Delaying;
                    self.clock.sleep(remaining).await;
                }

                info!(
                    name: "widget.reply.rendered",
                    escalated = reply.escalated,
                    elapsed = ?elapsed,
                    "Reply rendered"
                );
                let mut state = self.state();
                state.hide_typing();
                state.append(Message::reply(reply.reply, reply.escalated));
                SubmitOutcome::Replied {
                    escalated: reply.escalated,
                }
            }
            Err(e) => {
                warn!(name: "widget.request.failed", error = %e, "Chat request failed");
                let mut state = self.state();
                state.hide_typing();
                state.append(Message::bot(FALLBACK_REPLY));
                SubmitOutcome::Failed
            }
        };

        drop(guard);
        outcome
    }

    /// Append a row and scroll to it.
    pub fn append_message(&self, text: impl Into<String>, sender: Sender, meta: Option<String>) {
        self.state().append(Message::new(text, sender, meta));
    }

    /// Show the typing indicator if it is not already shown.
    pub fn show_typing_indicator(&self) {
        self.state().show_typing();
    }

    /// Remove the typing indicator if it is shown.
    pub fn remove_typing_indicator(&self) {
        self.state().hide_typing();
    }

    #[must_use]
    pub fn phase(&self) -> WidgetPhase {
        self.state().phase
    }

    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.state().typing
    }

    /// Snapshot of all messages appended so far.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// Run `f` against the view.
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.state().view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::ChatReply;
    use crate::widget::message::ESCALATION_NOTE;
    use crate::widget::view::{Transcript, ViewEvent};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Replies after a fixed latency.
    struct ScriptedTransport {
        latency: Duration,
        reply: Option<ChatReply>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn replying(latency_ms: u64, reply: ChatReply) -> Self {
            Self {
                latency: Duration::from_millis(latency_ms),
                reply: Some(reply),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(latency_ms: u64) -> Self {
            Self {
                latency: Duration::from_millis(latency_ms),
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.reply.clone().ok_or(Error::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    fn answer(text: &str) -> ChatReply {
        ChatReply {
            reply: text.to_string(),
            escalated: false,
            similarity: None,
        }
    }

    #[test]
    fn test_initialize_renders_greeting_once() {
        let widget = ChatWidget::new(ScriptedTransport::failing(0), Transcript::new());
        widget.initialize();
        widget.initialize();

        let messages = widget.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), DEFAULT_GREETING);
        assert_eq!(messages[0].sender(), Sender::Bot);
    }

    #[test]
    fn test_typing_indicator_is_idempotent() {
        let widget = ChatWidget::new(ScriptedTransport::failing(0), Transcript::new());

        widget.remove_typing_indicator();
        widget.show_typing_indicator();
        widget.show_typing_indicator();
        assert!(widget.is_typing());
        assert_eq!(widget.with_view(Transcript::typing_rows), 1);

        widget.remove_typing_indicator();
        widget.remove_typing_indicator();
        assert!(!widget.is_typing());
        widget.with_view(|view| {
            assert_eq!(view.typing_rows(), 0);
            // No-op calls neither draw nor scroll.
            assert_eq!(
                view.events(),
                &[
                    ViewEvent::TypingShown,
                    ViewEvent::Scrolled,
                    ViewEvent::TypingHidden,
                    ViewEvent::Scrolled,
                ]
            );
        });
    }

    #[test]
    fn test_removing_absent_indicator_does_not_scroll() {
        let widget = ChatWidget::new(ScriptedTransport::failing(0), Transcript::new());
        widget.remove_typing_indicator();
        widget.with_view(|view| assert!(view.events().is_empty()));
    }

    #[test]
    fn test_append_message_scrolls_smoothly() {
        let widget = ChatWidget::new(ScriptedTransport::failing(0), Transcript::new());
        widget.append_message("hello", Sender::User, None);

        widget.with_view(|view| {
            assert_eq!(
                view.events(),
                &[
                    ViewEvent::Row(Message::user("hello")),
                    ViewEvent::Scrolled,
                ]
            );
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_is_ignored() {
        let widget = ChatWidget::new(ScriptedTransport::failing(0), Transcript::new());

        assert_eq!(widget.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(widget.submit("   \t\n").await, SubmitOutcome::Ignored);

        assert!(widget.messages().is_empty());
        assert_eq!(widget.transport.calls(), 0);
        widget.with_view(|view| assert!(view.events().is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_reply_waits_for_minimum_delay() {
        let widget = ChatWidget::new(
            ScriptedTransport::replying(200, answer("Admissions open in June.")),
            Transcript::new(),
        );

        let start = Instant::now();
        let outcome = widget.submit("  when do admissions open?  ").await;
        let elapsed = start.elapsed();

        assert_eq!(outcome, SubmitOutcome::Replied { escalated: false });
        assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "{elapsed:?}");

        let messages = widget.messages();
        assert_eq!(messages[0], Message::user("when do admissions open?"));
        assert_eq!(messages[1], Message::bot("Admissions open in June."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_reply_adds_no_delay() {
        let widget = ChatWidget::new(
            ScriptedTransport::replying(1500, answer("Placements start in August.")),
            Transcript::new(),
        );

        let start = Instant::now();
        widget.submit("placements?").await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(1500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1600), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_indicator_shown_then_removed_before_reply() {
        let widget = ChatWidget::new(
            ScriptedTransport::replying(50, answer("Yes.")),
            Transcript::new(),
        );
        widget.submit("is there a hostel?").await;

        widget.with_view(|view| {
            assert_eq!(
                view.events(),
                &[
                    ViewEvent::Row(Message::user("is there a hostel?")),
                    ViewEvent::Scrolled,
                    ViewEvent::InputCleared,
                    ViewEvent::InputEnabled(false),
                    ViewEvent::TypingShown,
                    ViewEvent::Scrolled,
                    ViewEvent::TypingHidden,
                    ViewEvent::Scrolled,
                    ViewEvent::Row(Message::bot("Yes.")),
                    ViewEvent::Scrolled,
                    ViewEvent::InputEnabled(true),
                ]
            );
            assert_eq!(view.typing_rows(), 0);
        });
        assert_eq!(widget.phase(), WidgetPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalated_reply_is_annotated() {
        let reply = ChatReply::escalated("Forwarded to the office.", 0.1);
        let widget = ChatWidget::new(ScriptedTransport::replying(10, reply), Transcript::new());

        let outcome = widget.submit("can I pay in bitcoin?").await;
        assert_eq!(outcome, SubmitOutcome::Replied { escalated: true });

        let messages = widget.messages();
        let last = messages.last().unwrap();
        assert_eq!(last.text(), "Forwarded to the office.");
        assert_eq!(last.meta(), Some(ESCALATION_NOTE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_request_renders_fallback_immediately() {
        let widget = ChatWidget::new(ScriptedTransport::failing(100), Transcript::new());

        let start = Instant::now();
        let outcome = widget.submit("hello").await;
        let elapsed = start.elapsed();

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(elapsed < Duration::from_millis(200), "{elapsed:?}");
        widget.with_view(|view| {
            let fallbacks = view.count(|e| *e == ViewEvent::Row(Message::bot(FALLBACK_REPLY)));
            assert_eq!(fallbacks, 1);
            assert_eq!(view.typing_rows(), 0);
            assert!(view.input_enabled());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submit_while_pending_is_busy() {
        let widget = ChatWidget::new(
            ScriptedTransport::replying(300, answer("First answer.")),
            Transcript::new(),
        );

        let (first, second) = tokio::join!(widget.submit("first"), async {
            tokio::task::yield_now().await;
            widget.submit("second").await
        });

        assert_eq!(first, SubmitOutcome::Replied { escalated: false });
        assert_eq!(second, SubmitOutcome::Busy);
        assert_eq!(widget.transport.calls(), 1);
        assert_eq!(widget.messages().len(), 2);
        assert_eq!(widget.phase(), WidgetPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_is_delaying_during_minimum_delay() {
        let widget = ChatWidget::new(
            ScriptedTransport::replying(100, answer("ok")),
            Transcript::new(),
        );

        let (_, phases) = tokio::join!(widget.submit("hi"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let during_request = widget.phase();
            tokio::time::sleep(Duration::from_millis(500)).await;
            (during_request, widget.phase())
        });

        assert_eq!(phases, (WidgetPhase::Sending, WidgetPhase::Delaying));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_submit_leaves_widget_idle() {
        let widget = ChatWidget::new(
            ScriptedTransport::replying(5000, answer("too late")),
            Transcript::new(),
        );

        let result = tokio::time::timeout(Duration::from_millis(100), widget.submit("hello")).await;
        assert!(result.is_err());

        assert_eq!(widget.phase(), WidgetPhase::Idle);
        assert!(!widget.is_typing());
        widget.with_view(|view| {
            assert_eq!(view.typing_rows(), 0);
            assert!(view.input_enabled());
        });
        assert_eq!(widget.messages(), vec![Message::user("hello")]);
    }

    /// Never advances; records requested sleeps.
    #[derive(Default)]
    struct FrozenClock {
        at: std::sync::OnceLock<Instant>,
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Clock for FrozenClock {
        fn now(&self) -> Instant {
            *self.at.get_or_init(Instant::now)
        }

        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_injected_clock_drives_delay() {
        let clock = std::sync::Arc::new(FrozenClock::default());
        let widget = ChatWidget::new(ScriptedTransport::replying(0, answer("ok")), Transcript::new())
            .with_clock(std::sync::Arc::clone(&clock));

        widget.submit("hi").await;

        assert_eq!(*clock.sleeps.lock().unwrap(), vec![MIN_REPLY_DELAY]);
        assert_eq!(widget.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_minimum_delay() {
        let widget = ChatWidget::new(
            ScriptedTransport::replying(10, answer("ok")),
            Transcript::new(),
        )
        .with_min_reply_delay(Duration::from_millis(250));

        let start = Instant::now();
        widget.submit("hi").await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(300), "{elapsed:?}");
    }
}
