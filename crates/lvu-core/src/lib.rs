pub mod config;
pub mod logging;

pub mod dom;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod scan;
pub mod sim;
