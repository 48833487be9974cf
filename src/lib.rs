//! Medicine recommendation and inventory-transaction engine, with a Telegram
//! front end.
//!
//! The core lives in [`services`]: user registry, catalog, purchase ledger,
//! recommendation engine, substitute resolver and the transaction processor.
//! [`handlers`] is the chat request layer on top of it.

pub mod config;
pub mod db;
pub mod handlers;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
