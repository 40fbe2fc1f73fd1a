//! Process resource monitor: spawn one command, sample its process tree,
//! enforce an optional timeout and always reap it.

mod handle;
mod kill;
mod os;
mod peak;
mod reaper;
mod run;
mod sampler;
mod timeout;

#[cfg(test)]
pub(crate) mod scripted;

pub use handle::*;
pub use kill::*;
pub use os::{OsLauncher, OsProcess};
pub use peak::*;
pub use reaper::*;
pub use run::*;
pub use sampler::*;
pub use timeout::*;
