pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod report;
pub mod shuffle;
pub mod storage;
pub mod store;

pub use error::{AppError, Result};
pub use store::{RosterStore, StoreOptions};
