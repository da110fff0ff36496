/// Commands the chat page sends down to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    SendMessage {
        sender: String,
        body: String,
    },
    /// Fetch the next older page of history ("load more").
    LoadMore,
}
