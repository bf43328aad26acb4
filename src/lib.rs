//! Endless audio broadcast server — loop a directory of MP3s to every listener
//! and keep live listening statistics.

pub mod analytics;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod http;
pub mod listeners;
pub mod playlist;
