//! Loading and aggregation of the marriage registration dataset.
//!
//! A [`MarriageTable`] is loaded once per render cycle and every derived view
//! is a pure read of it. [`Dashboard::compute`] runs the whole cycle.

pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod schema;
pub mod table;
pub mod views;

pub use dashboard::Dashboard;
pub use error::{DatasetError, LoadError, Result, SchemaError};
pub use filter::FilterOptions;
pub use loader::{load, resolve_encoding};
pub use table::MarriageTable;
pub use views::{
    AgePairCount, FilterChoices, JobCount, MonthCount, SummaryMetrics, TypeCount,
};
