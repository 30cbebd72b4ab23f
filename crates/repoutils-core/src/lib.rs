//! Core types shared across repoutils: the variable store and template
//! expander, the scalar/list/map `Value` union, the cooperative-cancellation
//! token, and the error taxonomy.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cancellation;
pub mod error;
pub mod platform;
pub mod value;
pub mod variables;

pub use cancellation::CancellationToken;
pub use error::{Error, Kind, Result};
pub use value::Value;
pub use variables::VariableStore;

pub use parking_lot::{Mutex, RwLock};
