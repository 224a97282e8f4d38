//! Domain types, the aggregation engine and the entity store trait for the
//! Kechita microfinance dashboard.
//!
//! Nothing here touches HTTP or a database: the engine in [`metrics`] works
//! on row slices, and storage sits behind [`store::EntityStore`].

pub mod entity;
pub mod error;
pub mod load;
pub mod loan;
pub mod metrics;
pub mod performance;
pub mod risk;
pub mod store;

mod flag;

pub use error::{Error, Result};
