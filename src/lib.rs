pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod exchange;
pub mod inspector;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod ui;
