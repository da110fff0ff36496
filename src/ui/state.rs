/// Local state of the terminal chat page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPageState {
    pub sender: String,
    pub has_more: bool,
    /// Messages printed so far.
    pub visible: usize,
}

impl ChatPageState {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            has_more: false,
            visible: 0,
        }
    }
}
