use std::fmt;

use allocative::Allocative;

/// The scalar kinds a column can hold.
/// Every column stores exactly one of these, chosen at construction or inferred at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Allocative)]
pub enum DataType {
    /// A 64-bit signed integer.
    Int64,
    /// A 64-bit floating-point number.
    Float64,
    /// A boolean value (true or false).
    Bool,
    /// A variable-length UTF-8 character string.
    Utf8,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::Utf8 => "utf8",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
