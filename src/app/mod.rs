pub mod adb;
pub mod commands;
pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod models;
pub mod search;
pub mod state;
