pub mod applier;
pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod heal;
pub mod invoker;
pub mod io;
pub mod locator;
pub mod rules;
pub mod store;
pub mod types;

pub use error::{HealError, Result};
