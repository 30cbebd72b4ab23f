//! Subpackage fetch scheduling: per-kind backend dispatch, mirror
//! resolution, dedup, and breadth-first recursion into fetched
//! subpackages that are themselves projects (spec §4.5, §4.6).

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod outcome;
pub mod worker;

pub use backend::{Dispatcher, FetchOptions};
pub use error::{Result, SchedulerError};
pub use outcome::{Aggregates, FetchOutcome};
pub use worker::Scheduler;
