//! In-memory columnar frames with explicit null tracking, predicate filtering,
//! stable sorting and deferred query plans.

pub mod bitmap;
pub mod column;
pub mod data_type;
pub mod error;
pub mod expr;
pub mod frame;
pub mod output;
pub mod plan;
pub mod schema;
pub mod source;
pub mod value;

pub use bitmap::Bitmap;
pub use column::{BoolColumn, Column, Float64Column, Int64Column, TypedColumn, Utf8Column};
pub use data_type::DataType;
pub use error::{ConstructionError, Error, Result};
pub use expr::{ColRef, Expr, col};
pub use frame::{ColumnDef, Frame, Schema};
pub use plan::{LazyFrame, PlanOp, scan_csv, scan_json};
pub use source::{ScanOptions, read_csv, read_json};
pub use value::Value;
