pub mod config;
pub mod error;
pub mod ledger;
pub mod services;
pub mod types;
pub mod utils;
