pub mod cli;
pub mod credentials;
pub mod load_config;
pub mod upload;

pub use cli::{run, Cli, Commands};
