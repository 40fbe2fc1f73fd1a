//! cmdperf core library: process-tree resource monitoring and batch reporting.

mod batch;
mod config;
mod duration;
mod error;
mod monitor;
mod network;
mod profile;
mod report;
mod schema;

pub use batch::*;
pub use config::*;
pub use duration::*;
pub use error::*;
pub use monitor::*;
pub use network::*;
pub use profile::*;
pub use report::*;
pub use schema::*;
