use std::collections::HashSet;
use std::sync::Arc;

use crate::bitmap::BitmapBuilder;
use crate::column::{Column, NativeType, TypedColumn};
use crate::data_type::DataType;
use crate::error::{Error, Result};

/// Number of leading rows looked at when inferring a column's type.
pub const SAMPLE_ROWS: usize = 8192;

/// Raw field texts that mean "no value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullTokens {
    tokens: HashSet<String>,
}

impl NullTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.tokens.contains(raw)
    }
}

/// Parses one raw field into a typed value.
pub trait ParseRaw: NativeType {
    fn parse_raw(raw: &str) -> Option<Self>;
}

impl ParseRaw for i64 {
    fn parse_raw(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl ParseRaw for f64 {
    fn parse_raw(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl ParseRaw for bool {
    fn parse_raw(raw: &str) -> Option<Self> {
        parse_bool(raw)
    }
}

impl ParseRaw for Arc<str> {
    fn parse_raw(raw: &str) -> Option<Self> {
        Some(Arc::from(raw))
    }
}

/// Case-insensitive boolean parsing: `1`, `t`, `true`, `0`, `f`, `false`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Picks the most specific type every non-null sample value parses as,
/// trying `Int64`, then `Float64`, then `Bool`, and falling back to `Utf8`.
///
/// A sample with no non-null value is typed `Int64`.
///
/// ```
/// use oxyframe::DataType;
/// use oxyframe::schema::{NullTokens, infer_dtype};
///
/// let nulls = NullTokens::new(["", "NULL"]);
/// assert_eq!(infer_dtype(&["1", "NULL", "-3"], &nulls), DataType::Int64);
/// assert_eq!(infer_dtype(&["1", "2.5"], &nulls), DataType::Float64);
/// assert_eq!(infer_dtype(&["TRUE", "f"], &nulls), DataType::Bool);
/// assert_eq!(infer_dtype(&["1", "x"], &nulls), DataType::Utf8);
/// ```
pub fn infer_dtype<S: AsRef<str>>(sample: &[S], nulls: &NullTokens) -> DataType {
    let mut all_int = true;
    let mut all_float = true;
    let mut all_bool = true;
    for raw in sample {
        let raw: &str = raw.as_ref();
        if nulls.contains(raw) {
            continue;
        }
        all_int = all_int && i64::parse_raw(raw).is_some();
        all_float = all_float && f64::parse_raw(raw).is_some();
        all_bool = all_bool && bool::parse_raw(raw).is_some();
        if !(all_int || all_float || all_bool) {
            return DataType::Utf8;
        }
    }
    if all_int {
        DataType::Int64
    } else if all_float {
        DataType::Float64
    } else if all_bool {
        DataType::Bool
    } else {
        DataType::Utf8
    }
}

/// Accumulates one column of raw fields into typed values.
#[derive(Debug)]
pub struct TypedBuilder<T: ParseRaw> {
    values: Vec<T>,
    validity: BitmapBuilder,
    nulls: Arc<NullTokens>,
}

impl<T: ParseRaw> TypedBuilder<T> {
    pub fn new(nulls: Arc<NullTokens>) -> Self {
        Self {
            values: Vec::new(),
            validity: BitmapBuilder::new(),
            nulls,
        }
    }

    /// Appends one field. `row` is only used to report a parse failure.
    pub fn append(&mut self, raw: &str, row: usize) -> Result<()> {
        if self.nulls.contains(raw) {
            self.values.push(T::placeholder());
            self.validity.append(false);
            return Ok(());
        }
        let value = T::parse_raw(raw).ok_or_else(|| Error::Parse {
            row,
            dtype: T::DATA_TYPE,
            raw: raw.to_string(),
        })?;
        self.values.push(value);
        self.validity.append(true);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn build(self, name: impl Into<String>) -> TypedColumn<T> {
        TypedColumn::from_parts(name, self.values, self.validity.finish())
    }
}

/// A builder for whichever type a column was inferred or declared as.
#[derive(Debug)]
pub enum ColumnBuilder {
    Int64(TypedBuilder<i64>),
    Float64(TypedBuilder<f64>),
    Bool(TypedBuilder<bool>),
    Utf8(TypedBuilder<Arc<str>>),
}

impl ColumnBuilder {
    pub fn new(data_type: DataType, nulls: Arc<NullTokens>) -> Self {
        match data_type {
            DataType::Int64 => Self::Int64(TypedBuilder::new(nulls)),
            DataType::Float64 => Self::Float64(TypedBuilder::new(nulls)),
            DataType::Bool => Self::Bool(TypedBuilder::new(nulls)),
            DataType::Utf8 => Self::Utf8(TypedBuilder::new(nulls)),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Bool(_) => DataType::Bool,
            Self::Utf8(_) => DataType::Utf8,
        }
    }

    /// Appends exactly one value, or one null when `raw` is a null token.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] carrying `row` if `raw` does not parse as the builder's type.
    pub fn append(&mut self, raw: &str, row: usize) -> Result<()> {
        match self {
            Self::Int64(b) => b.append(raw, row),
            Self::Float64(b) => b.append(raw, row),
            Self::Bool(b) => b.append(raw, row),
            Self::Utf8(b) => b.append(raw, row),
        }
    }

    pub fn build(self, name: impl Into<String>) -> Column {
        match self {
            Self::Int64(b) => b.build(name).into(),
            Self::Float64(b) => b.build(name).into(),
            Self::Bool(b) => b.build(name).into(),
            Self::Utf8(b) => b.build(name).into(),
        }
    }
}
