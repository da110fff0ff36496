use super::types::ChatMessage;

/// Events a chat session pushes up to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// First page is in place; `messages` is newest first.
    Mounted {
        messages: Vec<ChatMessage>,
        has_more: bool,
    },
    /// Older messages appended at the tail of the feed.
    PageLoaded {
        messages: Vec<ChatMessage>,
        has_more: bool,
    },
    /// A new message was prepended at the head of the feed.
    MessageArrived(ChatMessage),
    LoadFailed(String),
    SendFailed(String),
    /// The live subscription dropped; the feed stays as it is.
    LiveStopped,
}
