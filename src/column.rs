use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use allocative::Allocative;

use crate::bitmap::{Bitmap, BitmapBuilder};
use crate::data_type::DataType;
use crate::value::Value;

/// A Rust scalar type that can be stored in a [`TypedColumn`].
///
/// Implemented for exactly the four engine types: `i64`, `f64`, `bool` and `Arc<str>`.
pub trait NativeType: Clone + fmt::Debug + PartialEq + Allocative + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    /// Value stored under a null row to keep the value array aligned with the bitmap.
    fn placeholder() -> Self;

    /// Canonical text form of a present value.
    fn render(&self) -> String;

    /// Plain `<` over values; never looks at validity.
    fn less(&self, other: &Self) -> bool;

    /// Total ascending order used by sorting.
    fn compare(&self, other: &Self) -> Ordering;

    fn to_value(&self) -> Value;
}

impl NativeType for i64 {
    const DATA_TYPE: DataType = DataType::Int64;

    fn placeholder() -> Self {
        0
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn less(&self, other: &Self) -> bool {
        self < other
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl NativeType for f64 {
    const DATA_TYPE: DataType = DataType::Float64;

    fn placeholder() -> Self {
        0.0
    }

    fn render(&self) -> String {
        format_float(*self)
    }

    fn less(&self, other: &Self) -> bool {
        self < other
    }

    // NaN sorts after every number; -0.0 and 0.0 tie.
    fn compare(&self, other: &Self) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.partial_cmp(other).unwrap_or(Ordering::Equal),
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

/// Shortest round-trip text of a float in `%g` style.
///
/// Uses exponent form (`1.234567e+06`, `1e-05`) when the decimal exponent is below -4
/// or at least 6, and plain digits otherwise. Infinities are `+Inf`/`-Inf`, NaN is `NaN`.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    // `{:e}` gives the shortest round-trip digits, e.g. "-1.5e-7"
    let scientific = format!("{v:e}");
    let (mantissa, exp) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let body = if !(-4..6).contains(&exp) {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exp < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{head}e{exp_sign}{:02}", exp.abs())
        } else {
            format!("{head}.{tail}e{exp_sign}{:02}", exp.abs())
        }
    } else if exp < 0 {
        format!("0.{}{digits}", "0".repeat((-exp - 1) as usize))
    } else {
        let point = exp as usize + 1;
        if digits.len() <= point {
            format!("{digits}{}", "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    format!("{sign}{body}")
}

impl NativeType for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn placeholder() -> Self {
        false
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn less(&self, other: &Self) -> bool {
        !*self && *other
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl NativeType for Arc<str> {
    const DATA_TYPE: DataType = DataType::Utf8;

    fn placeholder() -> Self {
        Arc::from("")
    }

    fn render(&self) -> String {
        self.to_string()
    }

    fn less(&self, other: &Self) -> bool {
        self.as_bytes() < other.as_bytes()
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }

    fn to_value(&self) -> Value {
        Value::Text(Arc::clone(self))
    }
}

/// A named, immutable column of one scalar type.
///
/// Pairs a dense value array with a validity [`Bitmap`]. The value stored under a
/// null row is a placeholder and is ignored by every consumer.
#[derive(Debug, Clone, Allocative)]
pub struct TypedColumn<T: NativeType> {
    name: String,
    values: Vec<T>,
    validity: Bitmap,
}

pub type Int64Column = TypedColumn<i64>;
pub type Float64Column = TypedColumn<f64>;
pub type BoolColumn = TypedColumn<bool>;
pub type Utf8Column = TypedColumn<Arc<str>>;

impl<T: NativeType> TypedColumn<T> {
    /// Builds a column from values and an optional per-row validity sequence.
    /// Without `validity` every row is present.
    ///
    /// # Panics
    /// Panics if `validity` is given with a length different from `values`.
    pub fn new(name: impl Into<String>, values: Vec<T>, validity: Option<&[bool]>) -> Self {
        let validity = match validity {
            Some(flags) => Bitmap::from_bools(flags),
            None => Bitmap::new(values.len(), true),
        };
        Self::from_parts(name, values, validity)
    }

    /// Takes ownership of already built parts.
    ///
    /// # Panics
    /// Panics if the bitmap does not cover exactly `values.len()` rows.
    pub fn from_parts(name: impl Into<String>, values: Vec<T>, validity: Bitmap) -> Self {
        let name = name.into();
        assert_eq!(
            values.len(),
            validity.len(),
            "column {name:?}: validity length must match value count"
        );
        Self {
            name,
            values,
            validity,
        }
    }

    /// Builds a column where `None` entries are null.
    pub fn from_options<I>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
    {
        let items = items.into_iter();
        let mut values = Vec::with_capacity(items.size_hint().0);
        let mut validity = BitmapBuilder::with_capacity(items.size_hint().0);
        for item in items {
            validity.append(item.is_some());
            values.push(item.unwrap_or_else(T::placeholder));
        }
        Self::from_parts(name, values, validity.finish())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_null(&self, i: usize) -> bool {
        !self.validity.get(i)
    }

    /// The value at row `i`, or `None` when it is null.
    pub fn get(&self, i: usize) -> Option<&T> {
        if self.is_null(i) {
            None
        } else {
            Some(&self.values[i])
        }
    }

    pub fn validity(&self) -> &Bitmap {
        &self.validity
    }

    pub fn null_count(&self) -> usize {
        self.len() - self.validity.count_valid()
    }

    /// Canonical text of row `i`; a null row renders as the empty string.
    pub fn value_string(&self, i: usize) -> String {
        match self.get(i) {
            Some(v) => v.render(),
            None => String::new(),
        }
    }

    /// Compares the raw values of two rows, ignoring validity.
    pub fn less(&self, i: usize, j: usize) -> bool {
        self.values[i].less(&self.values[j])
    }

    /// Returns a new column with exactly the rows where `mask[i]` is true, in order.
    ///
    /// # Panics
    /// Panics if `mask.len() != self.len()`.
    pub fn filter(&self, mask: &[bool]) -> Self {
        assert_eq!(
            mask.len(),
            self.len(),
            "column {:?}: filter mask length must match column length",
            self.name
        );
        let kept = mask.iter().filter(|keep| **keep).count();
        let mut values = Vec::with_capacity(kept);
        let mut validity = BitmapBuilder::with_capacity(kept);
        for (i, _) in mask.iter().enumerate().filter(|(_, keep)| **keep) {
            values.push(self.values[i].clone());
            validity.append(self.validity.get(i));
        }
        Self::from_parts(self.name.clone(), values, validity.finish())
    }

    /// Gathers rows by index. Indices may repeat and appear in any order.
    ///
    /// # Panics
    /// Panics if an index is out of range.
    pub fn take(&self, order: &[usize]) -> Self {
        let mut values = Vec::with_capacity(order.len());
        let mut validity = BitmapBuilder::with_capacity(order.len());
        for &row in order {
            values.push(self.values[row].clone());
            validity.append(self.validity.get(row));
        }
        Self::from_parts(self.name.clone(), values, validity.finish())
    }
}

/// Two columns are equal when names, lengths, null patterns and present values match.
/// Placeholders under null rows are not compared.
impl<T: NativeType> PartialEq for TypedColumn<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.len() == other.len()
            && (0..self.len()).all(|i| self.get(i) == other.get(i))
    }
}

/// A column of any of the four engine types.
#[derive(Debug, Clone, PartialEq, Allocative)]
pub enum Column {
    Int64(Int64Column),
    Float64(Float64Column),
    Bool(BoolColumn),
    Utf8(Utf8Column),
}

macro_rules! dispatch {
    ($column:expr, $inner:ident => $body:expr) => {
        match $column {
            Column::Int64($inner) => $body,
            Column::Float64($inner) => $body,
            Column::Bool($inner) => $body,
            Column::Utf8($inner) => $body,
        }
    };
}
pub(crate) use dispatch;

impl Column {
    /// Builds an `Int64` column; `None` entries are null.
    ///
    /// ```
    /// use oxyframe::{Column, DataType, Value};
    ///
    /// let age = Column::int64("age", [Some(10), None, Some(7)]);
    /// assert_eq!(age.data_type(), DataType::Int64);
    /// assert!(age.is_null(1));
    /// assert_eq!(age.get(2), Some(Value::Int(7)));
    /// ```
    pub fn int64<I>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        Self::Int64(TypedColumn::from_options(name, items))
    }

    pub fn float64<I>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        Self::Float64(TypedColumn::from_options(name, items))
    }

    pub fn boolean<I>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = Option<bool>>,
    {
        Self::Bool(TypedColumn::from_options(name, items))
    }

    pub fn utf8<I, S>(name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<Arc<str>>,
    {
        Self::Utf8(TypedColumn::from_options(
            name,
            items.into_iter().map(|item| item.map(Into::into)),
        ))
    }

    pub fn name(&self) -> &str {
        dispatch!(self, c => c.name())
    }

    pub fn data_type(&self) -> DataType {
        dispatch!(self, c => c.data_type())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, c => c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, i: usize) -> bool {
        dispatch!(self, c => c.is_null(i))
    }

    pub fn null_count(&self) -> usize {
        dispatch!(self, c => c.null_count())
    }

    /// Retrieves the value at the specified row index.
    ///
    /// Returns `None` if the index is out of bounds and `Some(Value::Null)` for a null row.
    pub fn get(&self, i: usize) -> Option<Value> {
        if i >= self.len() {
            return None;
        }
        Some(dispatch!(self, c => c.get(i).map_or(Value::Null, NativeType::to_value)))
    }

    pub fn value_string(&self, i: usize) -> String {
        dispatch!(self, c => c.value_string(i))
    }

    pub fn less(&self, i: usize, j: usize) -> bool {
        dispatch!(self, c => c.less(i, j))
    }

    pub fn filter(&self, mask: &[bool]) -> Self {
        dispatch!(self, c => Self::from(c.filter(mask)))
    }

    pub fn take(&self, order: &[usize]) -> Self {
        dispatch!(self, c => Self::from(c.take(order)))
    }

    pub fn as_bool(&self) -> Option<&BoolColumn> {
        match self {
            Self::Bool(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Int64Column> for Column {
    fn from(c: Int64Column) -> Self {
        Self::Int64(c)
    }
}

impl From<Float64Column> for Column {
    fn from(c: Float64Column) -> Self {
        Self::Float64(c)
    }
}

impl From<BoolColumn> for Column {
    fn from(c: BoolColumn) -> Self {
        Self::Bool(c)
    }
}

impl From<Utf8Column> for Column {
    fn from(c: Utf8Column) -> Self {
        Self::Utf8(c)
    }
}
