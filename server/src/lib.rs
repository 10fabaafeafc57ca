mod board;
mod broadcast;
mod config;
mod error;
mod runner;
mod service;

pub use board::Board;
pub use broadcast::{broadcast, Subscription};
pub use config::Config;
pub use error::CommandError;
pub use runner::{Command, DispatchHandle, SeedRunner, DEFAULT_DRIFT_STEP_DEG};
pub use service::DispatchService;
