//! Logs your weekly WakaTime activity into a shared Google Sheet.
//! The `log` command takes the last finished work week, lets you pick the projects that count and
//! writes the daily average, the most active day and the total time into your row.
//!

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod report;
pub mod sheets;
pub mod store;
pub mod utils;
pub mod wakatime;
