use std::fmt;

use chrono::{DateTime, Utc};

use crate::storage::{Document, FieldValue, Fields};

pub const CHAT_COLLECTION: &str = "chat";
pub const MENU_COLLECTION: &str = "menu";

pub const FIELD_SENDER: &str = "sender";
pub const FIELD_BODY: &str = "body";
pub const FIELD_CREATED_AT: &str = "created_at";

pub const FIELD_CODE: &str = "code";
pub const FIELD_NAME: &str = "name";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_PRICE: &str = "price";

/// Domain model for one chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender: String,
    pub body: String,
    /// `None` while the store has not stamped the message yet.
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Decode a chat document. Missing or mistyped fields fall back to empty
    /// strings and a pending timestamp instead of failing.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            sender: doc.string_or_default(FIELD_SENDER),
            body: doc.string_or_default(FIELD_BODY),
            created_at: doc.get(FIELD_CREATED_AT).and_then(FieldValue::as_timestamp),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.created_at.is_none()
    }

    /// Field map for a new outgoing message, stamped by the store on write.
    pub fn outgoing_fields(sender: &str, body: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert(FIELD_SENDER.to_string(), FieldValue::from(sender));
        fields.insert(FIELD_BODY.to_string(), FieldValue::from(body));
        fields.insert(FIELD_CREATED_AT.to_string(), FieldValue::ServerTimestamp);
        fields
    }
}

/// Menu sections used by the admin and waiter pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Category {
    #[default]
    Food,
    Side,
    Drink,
    Other(String),
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Food, Category::Side, Category::Drink];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Food => "makanan",
            Category::Side => "pelengkap",
            Category::Drink => "minuman",
            Category::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Category::Food => "🍛 Makanan".to_string(),
            Category::Side => "🥗 Pelengkap".to_string(),
            Category::Drink => "🍹 Minuman".to_string(),
            Category::Other(raw) => raw.clone(),
        }
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "makanan" => Category::Food,
            "pelengkap" => Category::Side,
            "minuman" => Category::Drink,
            _ => Category::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the menu catalog. Prices are whole rupiah.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub code: String,
    pub name: String,
    pub category: Category,
    pub price: i64,
}

impl MenuItem {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            code: doc.string_or_default(FIELD_CODE),
            name: doc.string_or_default(FIELD_NAME),
            category: Category::from(doc.string_or_default(FIELD_CATEGORY).as_str()),
            price: doc.get(FIELD_PRICE).and_then(FieldValue::as_i64).unwrap_or(0),
        }
    }
}
