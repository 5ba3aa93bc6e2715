//! Data model for scraped listings
//!
//! - `Field<T>`: a value or the explicit absent-marker
//! - `BusinessRecord`: one fixed-shape scraped business
//! - `FieldKind`: names the readable fields of a detail view

mod field;
mod record;

pub use field::{Field, ABSENT_MARKER};
pub use record::{format_bool, name_key, BusinessRecord, FieldKind, CSV_COLUMNS};
