//! Live per-container resource usage table fed by stats streams from a stattop agent.

pub mod app;
pub mod cli;
pub mod cpu;
pub mod error;
pub mod profiles;
pub mod source;
pub mod stats;
pub mod types;
pub mod ui;
pub mod ws;
