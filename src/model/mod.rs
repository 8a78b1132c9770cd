pub mod config;
pub mod performance;
pub mod score;
