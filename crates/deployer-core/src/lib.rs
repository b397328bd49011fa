pub mod args;
pub mod artifact;
pub mod builtin;
pub mod config;
pub mod error;
pub mod executor;
pub mod io;
pub mod link;
pub mod orchestrator;
pub mod paths;
pub mod post_action;
pub mod registry;
pub mod stage;
pub mod step;
pub mod types;

pub use error::{DeployerError, ErrorKind, Result};
pub use orchestrator::{Orchestrator, RunOptions, RunReport};
pub use registry::Registry;
pub use stage::Stage;
