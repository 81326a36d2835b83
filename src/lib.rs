pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod intake;
pub mod progress;
pub mod render;
pub mod report;
pub mod service;
pub mod util;
pub mod workflow;
