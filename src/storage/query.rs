use super::document::{Direction, Document, PageCursor};

/// An ordered, limited view over one collection.
///
/// Documents without the order field are left out; ties on the order field
/// break by id in the query direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedQuery {
    pub collection: String,
    pub order_field: String,
    pub direction: Direction,
    pub limit: usize,
}

impl OrderedQuery {
    pub fn new(
        collection: impl Into<String>,
        order_field: impl Into<String>,
        direction: Direction,
        limit: usize,
    ) -> Self {
        Self {
            collection: collection.into(),
            order_field: order_field.into(),
            direction,
            limit,
        }
    }

    pub fn cursor_for(&self, doc: &Document) -> Option<PageCursor> {
        PageCursor::at(doc, &self.order_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FieldValue, Fields};

    #[test]
    fn cursor_needs_the_order_field() {
        let query = OrderedQuery::new("c", "at", Direction::Descending, 10);

        let mut fields = Fields::new();
        fields.insert("at".to_string(), FieldValue::Integer(7));
        let cursor = query.cursor_for(&Document::new("a", fields)).unwrap();
        assert_eq!(cursor.document_id(), "a");
        assert_eq!(cursor.value, FieldValue::Integer(7));

        assert!(query.cursor_for(&Document::new("bare", Fields::new())).is_none());
    }
}
