//! Menu administration and waiter orders. Plain request/response calls over
//! the document store.

pub mod catalog;
pub mod order;
pub mod receipt;

pub use catalog::{
    MAX_PRICE, MenuCatalog, MenuError, MenuUpdate, NewMenuItem, filter_items, group_by_category,
};
pub use order::{Order, OrderError, OrderLine};
pub use receipt::{format_rupiah, render_receipt};
