pub mod config;
pub mod enhance;
pub mod health;
pub mod history;
pub mod serve;
