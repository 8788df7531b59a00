//! CLI command handlers, one per file.

mod completions;
mod config;
mod input;
mod resolve;
mod rewrite;
mod simulate;

pub use completions::run_completions;
pub use config::run_config;
pub use resolve::run_resolve;
pub use rewrite::run_rewrite;
pub use simulate::run_simulate;
