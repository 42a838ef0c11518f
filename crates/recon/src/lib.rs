//! `tally-recon`: two-table reconciliation engine.
//!
//! Pure engine crate: receives parsed tables, a column mapping and
//! comparison settings, returns classified rows. No CLI dependencies.

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod summary;

pub use compare::values_equal;
pub use config::{ColumnMapping, ComparisonSettings, MappingPair, ReconConfig};
pub use engine::{load_csv_table, run, ReconInput};
pub use error::ReconError;
pub use key::build_key;
pub use model::{ColumnView, ComparisonRow, Record, ReconResult, RowKind, Side, Table};
pub use normalize::{normalize, normalize_value, NormalizedValue};
pub use reconcile::reconcile;
