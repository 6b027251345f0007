//! The chat widget and the surfaces it renders into.
//!
//! The widget owns no global state: it is handed a [`ChatView`] to draw
//! into, a [`ChatTransport`](crate::client::ChatTransport) to reach the
//! chat endpoint, and a [`Clock`] for the minimum reply delay.
//!
//! # Structure
//!
//! - [`ChatWidget`]: message list, typing indicator, submit cycle
//! - [`ChatView`]: rendering surface; [`Transcript`] records calls in memory,
//!   [`TerminalView`] writes lines to a terminal
//! - [`Clock`]: time source; [`TokioClock`] by default
//!
//! # Example
//!
//! ```rust
//! use unibot::widget::{Message, Sender, Transcript, ChatView};
//!
//! let mut view = Transcript::new();
//! view.append_row(&Message::user("Hello!"));
//! assert_eq!(view.rows()[0].sender(), Sender::User);
//! ```

mod chat;
mod clock;
mod message;
mod terminal;
mod view;

pub use chat::{
    ChatWidget, DEFAULT_GREETING, FALLBACK_REPLY, MIN_REPLY_DELAY, SubmitOutcome, WidgetPhase,
};
pub use clock::{Clock, TokioClock};
pub use message::{ESCALATION_NOTE, Message, Sender};
pub use terminal::{QUIT_COMMAND, TerminalView, run_repl};
pub use view::{ChatView, Transcript, ViewEvent};
