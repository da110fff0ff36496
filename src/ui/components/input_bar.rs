/// What a line typed on the chat page asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Send(String),
    LoadMore,
    /// Change the display name used for outgoing messages.
    Rename(String),
    Quit,
}

pub fn parse(line: &str) -> Option<ChatInput> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.split_once(char::is_whitespace) {
        Some(("/name", name)) if !name.trim().is_empty() => {
            Some(ChatInput::Rename(name.trim().to_string()))
        }
        _ => match trimmed {
            "/more" => Some(ChatInput::LoadMore),
            "/quit" | "/exit" => Some(ChatInput::Quit),
            _ => Some(ChatInput::Send(line.trim_end_matches(['\r', '\n']).to_string())),
        },
    }
}
