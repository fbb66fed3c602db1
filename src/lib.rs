pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod providers;
pub mod supervision;
#[cfg(test)]
pub mod test_helpers;
