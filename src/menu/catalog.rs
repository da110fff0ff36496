use std::sync::Arc;

use thiserror::Error;

use crate::common::types::{FIELD_CATEGORY, FIELD_CODE, FIELD_NAME, FIELD_PRICE, MENU_COLLECTION};
use crate::common::{Category, MenuItem};
use crate::storage::{Document, DocumentStore, FieldValue, Fields, StoreError};

/// Highest accepted menu price, in rupiah.
pub const MAX_PRICE: i64 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("field `{0}` must not be empty")]
    MissingField(&'static str),

    #[error("price must not be negative (got {0})")]
    NegativePrice(i64),

    #[error("price must be at most 1000000000 (got {0})")]
    PriceTooHigh(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input of the "add menu" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMenuItem {
    pub code: String,
    pub name: String,
    pub category: Category,
    pub price: i64,
}

/// Fields changed by the edit form; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<i64>,
}

impl MenuUpdate {
    fn validate(&self) -> Result<(), MenuError> {
        if self.code.as_deref().is_some_and(|code| code.trim().is_empty()) {
            return Err(MenuError::MissingField(FIELD_CODE));
        }
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(MenuError::MissingField(FIELD_NAME));
        }
        match self.price {
            Some(price) if price < 0 => Err(MenuError::NegativePrice(price)),
            Some(price) if price > MAX_PRICE => Err(MenuError::PriceTooHigh(price)),
            _ => Ok(()),
        }
    }

    fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        if let Some(code) = self.code {
            fields.insert(FIELD_CODE.to_string(), FieldValue::from(code.trim()));
        }
        if let Some(name) = self.name {
            fields.insert(FIELD_NAME.to_string(), FieldValue::from(name.trim()));
        }
        if let Some(category) = self.category {
            fields.insert(FIELD_CATEGORY.to_string(), FieldValue::from(category.as_str()));
        }
        if let Some(price) = self.price {
            fields.insert(FIELD_PRICE.to_string(), FieldValue::Integer(price));
        }
        fields
    }
}

/// CRUD over the `menu` collection.
pub struct MenuCatalog {
    store: Arc<dyn DocumentStore>,
}

impl MenuCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<MenuItem>, MenuError> {
        let documents = self.store.list(MENU_COLLECTION).await?;
        Ok(documents.iter().map(MenuItem::from_document).collect())
    }

    pub async fn add(&self, item: NewMenuItem) -> Result<MenuItem, MenuError> {
        let update = MenuUpdate {
            code: Some(item.code),
            name: Some(item.name),
            category: Some(item.category),
            price: Some(item.price),
        };
        update.validate()?;

        let fields = update.into_fields();
        let id = self.store.write(MENU_COLLECTION, fields.clone()).await?;
        log::info!("Added menu item {id}");
        Ok(MenuItem::from_document(&Document::new(id, fields)))
    }

    pub async fn update(&self, id: &str, update: MenuUpdate) -> Result<(), MenuError> {
        update.validate()?;
        let fields = update.into_fields();
        if fields.is_empty() {
            return Ok(());
        }
        self.store.update(MENU_COLLECTION, id, fields).await?;
        log::info!("Updated menu item {id}");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), MenuError> {
        self.store.delete(MENU_COLLECTION, id).await?;
        log::info!("Deleted menu item {id}");
        Ok(())
    }

    /// Find an item by its short code, ignoring case.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<MenuItem>, MenuError> {
        let code = code.trim();
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|item| item.code.eq_ignore_ascii_case(code)))
    }
}

/// Admin table filter: case-insensitive match on name or code, plus an
/// optional exact category.
pub fn filter_items<'a>(
    items: &'a [MenuItem],
    search: &str,
    category: Option<&Category>,
) -> Vec<&'a MenuItem> {
    let needle = search.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            needle.is_empty()
                || item.name.to_lowercase().contains(&needle)
                || item.code.to_lowercase().contains(&needle)
        })
        .filter(|item| category.is_none_or(|category| &item.category == category))
        .collect()
}

/// Waiter page sections: food, sides, drinks. Items in other categories are
/// not offered.
pub fn group_by_category(items: &[MenuItem]) -> Vec<(Category, Vec<&MenuItem>)> {
    Category::ALL
        .iter()
        .map(|category| {
            let section = items
                .iter()
                .filter(|item| &item.category == category)
                .collect();
            (category.clone(), section)
        })
        .collect()
}
