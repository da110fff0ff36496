use std::collections::{HashSet, VecDeque};

use crate::common::ChatMessage;

/// Which end of the feed a message is admitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Newer than everything visible (live path).
    Head,
    /// Older than everything visible (history path).
    Tail,
}

/// Newest-first message list plus the ids already in it.
///
/// Order comes from where messages are admitted, never from sorting, so a
/// message still waiting for its timestamp keeps its place.
#[derive(Debug, Default)]
pub struct Feed {
    messages: VecDeque<ChatMessage>,
    seen: HashSet<String>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `message` unless its id was admitted before. Returns whether the
    /// feed changed.
    pub fn admit(&mut self, message: ChatMessage, placement: Placement) -> bool {
        if !self.seen.insert(message.id.clone()) {
            log::trace!("Skipping already visible message {}", message.id);
            return false;
        }
        match placement {
            Placement::Head => self.messages.push_front(message),
            Placement::Tail => self.messages.push_back(message),
        }
        true
    }

    /// Admit a fetched page at the tail, keeping its order. Returns the
    /// messages that were actually new.
    pub fn admit_page(&mut self, page: Vec<ChatMessage>) -> Vec<ChatMessage> {
        page.into_iter()
            .filter(|message| self.admit(message.clone(), Placement::Tail))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn head(&self) -> Option<&ChatMessage> {
        self.messages.front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn message(id: &str, secs: Option<i64>) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            sender: "Bunda".to_string(),
            body: format!("pesan {id}"),
            created_at: secs.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    fn ids(feed: &Feed) -> Vec<&str> {
        feed.iter().map(|message| message.id.as_str()).collect()
    }

    #[test]
    fn second_admission_of_an_id_is_rejected() {
        let mut feed = Feed::new();
        assert!(feed.admit(message("a", Some(10)), Placement::Tail));
        assert!(!feed.admit(message("a", Some(10)), Placement::Head));
        assert!(!feed.admit(message("a", Some(10)), Placement::Tail));
        assert_eq!(feed.len(), 1);
        assert!(feed.contains("a"));
    }

    #[test]
    fn head_and_tail_grow_in_opposite_directions() {
        let mut feed = Feed::new();
        feed.admit_page(vec![message("c", Some(30)), message("b", Some(20))]);
        feed.admit(message("d", Some(40)), Placement::Head);
        feed.admit_page(vec![message("a", Some(10))]);

        assert_eq!(ids(&feed), vec!["d", "c", "b", "a"]);
        assert_eq!(feed.head().map(|m| m.id.as_str()), Some("d"));
    }

    #[test]
    fn page_admission_reports_only_new_messages() {
        let mut feed = Feed::new();
        feed.admit(message("b", Some(20)), Placement::Head);

        let admitted = feed.admit_page(vec![message("b", Some(20)), message("a", Some(10))]);
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].id, "a");
    }

    #[test]
    fn pending_message_is_not_reordered() {
        let mut feed = Feed::new();
        feed.admit_page(vec![message("b", Some(20)), message("a", Some(10))]);
        feed.admit(message("p", None), Placement::Head);
        feed.admit_page(vec![message("z", Some(5))]);

        assert_eq!(ids(&feed), vec!["p", "b", "a", "z"]);
    }
}
