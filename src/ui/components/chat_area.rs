use chrono::Local;

use crate::common::ChatMessage;

pub const PENDING_MARK: &str = "⏳";

pub fn format_time(message: &ChatMessage) -> String {
    match message.created_at {
        Some(at) => at.with_timezone(&Local).format("%d/%m/%y %H.%M").to_string(),
        None => PENDING_MARK.to_string(),
    }
}

pub fn render_message(message: &ChatMessage) -> String {
    format!("{} • {}\n  {}", message.sender, format_time(message), message.body)
}

pub fn render_feed<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>) -> String {
    messages
        .into_iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}
