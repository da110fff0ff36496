//! Warung: menu catalog, waiter orders and a realtime chat feed backed by a
//! document store.

pub mod common;
pub mod config;
pub mod feed;
pub mod menu;
pub mod storage;
pub mod ui;
