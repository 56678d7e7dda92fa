//! Domain layer containing the records exchanged with the enrollment backend.

pub mod entities;

pub use entities::*;
