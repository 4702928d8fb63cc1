// Domain models: metric domains, the per-domain column contract and normalized tables

mod domain;
pub mod schema;
mod table;

pub use domain::{Domain, SourceFormat};
pub use schema::{DomainSchema, FieldKind, FieldSpec, Unit};
pub use table::{Metric, NormalizedTable, Row};

pub(crate) use table::TableBuilder;
