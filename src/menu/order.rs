use chrono::{DateTime, Local};
use thiserror::Error;

use crate::common::MenuItem;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("adding {0} would overflow the order total")]
    TotalOverflow(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub item_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
}

impl OrderLine {
    /// Never saturates for lines of an [`Order`], which rejects overflowing
    /// additions.
    pub fn subtotal(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }

    fn checked_subtotal(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

/// The waiter's in-progress order for one customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    pub customer: String,
    lines: Vec<OrderLine>,
    printed_at: Option<DateTime<Local>>,
}

impl Order {
    pub fn new(customer: impl Into<String>) -> Self {
        Self {
            customer: customer.into(),
            ..Self::default()
        }
    }

    /// Add one portion of `item`; a repeat bumps the existing line. The order
    /// is left unchanged if a subtotal or the total would overflow.
    pub fn add_item(&mut self, item: &MenuItem) -> Result<(), OrderError> {
        let overflow = || OrderError::TotalOverflow(item.name.clone());
        let existing = self.lines.iter().position(|line| line.item_id == item.id);
        match existing {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = line.quantity.checked_add(1).ok_or_else(overflow)?;
            }
            None => self.lines.push(OrderLine {
                item_id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
                quantity: 1,
            }),
        }

        if self.checked_total().is_none() {
            match existing {
                Some(index) => self.lines[index].quantity -= 1,
                None => {
                    self.lines.pop();
                }
            }
            return Err(overflow());
        }
        Ok(())
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |total, line| total.saturating_add(line.subtotal()))
    }

    fn checked_total(&self) -> Option<i64> {
        self.lines
            .iter()
            .try_fold(0i64, |total, line| total.checked_add(line.checked_subtotal()?))
    }

    pub fn printed_at(&self) -> Option<DateTime<Local>> {
        self.printed_at
    }

    pub fn mark_printed(&mut self, at: DateTime<Local>) {
        self.printed_at = Some(at);
    }

    /// Clear lines, customer and print time for the next customer.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Category;

    fn menu_item(id: &str, price: i64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: format!("Menu {id}"),
            category: Category::Food,
            price,
        }
    }

    #[test]
    fn repeated_item_increments_quantity() {
        let mut order = Order::new("Pak Budi");
        let rice = menu_item("a", 12_000);
        let tea = menu_item("b", 4_000);

        order.add_item(&rice).unwrap();
        order.add_item(&tea).unwrap();
        order.add_item(&rice).unwrap();

        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.lines()[0].quantity, 2);
        assert_eq!(order.lines()[0].subtotal(), 24_000);
        assert_eq!(order.total(), 28_000);
    }

    #[test]
    fn reset_clears_everything() {
        let mut order = Order::new("Bu Sri");
        order.add_item(&menu_item("a", 1_000)).unwrap();
        order.mark_printed(Local::now());

        order.reset();
        assert!(order.is_empty());
        assert_eq!(order.customer, "");
        assert_eq!(order.printed_at(), None);
        assert_eq!(order.total(), 0);
    }

    #[test]
    fn overflowing_item_is_rejected_and_order_kept() {
        let mut order = Order::new("Pak Budi");
        let tea = menu_item("b", 4_000);
        let gold = menu_item("g", i64::MAX / 2 + 1);
        order.add_item(&tea).unwrap();
        order.add_item(&gold).unwrap();

        assert_eq!(
            order.add_item(&gold),
            Err(OrderError::TotalOverflow("Menu g".to_string()))
        );
        assert_eq!(order.lines()[1].quantity, 1);

        let mut crowded = Order::new("");
        crowded.add_item(&menu_item("c", i64::MAX - 1)).unwrap();
        assert!(crowded.add_item(&tea).is_err());
        assert_eq!(crowded.lines().len(), 1);
        assert_eq!(crowded.total(), i64::MAX - 1);
    }
}
