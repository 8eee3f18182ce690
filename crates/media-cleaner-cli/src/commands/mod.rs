pub mod config;
pub mod daemon;
pub mod progress;
pub mod prompts;
pub mod scan;
pub mod snapshot;
