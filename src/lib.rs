pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod events;
pub mod health;
pub mod insights;
pub mod session;
pub mod utils;
pub mod web;
