//! Service Module
//!
//! Business logic layer for the orchestrator. The [`Orchestrator`] owns the
//! run lifecycle; background watch tasks live in a [`WatcherSet`].

pub mod execution;
pub mod watcher;

pub use execution::{ExecutionError, Orchestrator};
pub use watcher::{PersistingHandler, WatcherSet};
