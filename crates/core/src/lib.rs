//! Core grid types shared by every cellgrid crate.
//!
//! - `value`: the closed cell-value variant and column types
//! - `row`: synthetic row ids and raw row storage shapes
//! - `schema`: ordered, key-unique column definitions
//! - `selection`: selection ranges and the minimal-range algebra
//! - `address`: cell addresses and their resolution to indices

pub mod address;
pub mod row;
pub mod schema;
pub mod selection;
pub mod value;

pub use address::{AddressSpace, CellAddress};
pub use row::{RowData, RowId};
pub use schema::{Column, Formula, Schema, SchemaError, SelectOption, ValidationRule};
pub use selection::{merge_ranges, RangeKind, Selection, SelectionRange};
pub use value::{CellValue, ColumnType};
