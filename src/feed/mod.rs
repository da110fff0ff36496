//! The chat feed: one newest-first list fed from two directions.
//!
//! The [`HistoryLoader`] pages backwards through stored messages and appends
//! them at the tail; the [`LiveTailWatcher`] follows the newest stored message
//! and prepends arrivals at the head. Both go through [`Feed::admit`], whose
//! seen-id set keeps every message in the feed exactly once.

pub mod history;
pub mod live;
pub mod merge;
pub mod session;

pub use history::{DEFAULT_PAGE_SIZE, HistoryLoader, HistoryPage};
pub use live::{LiveTailWatcher, Subscription, TailEvent, TailFilter, TailState};
pub use merge::{Feed, Placement};
pub use session::{ChatSession, SessionClosed, SessionHandle};
