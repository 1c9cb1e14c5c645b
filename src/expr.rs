use std::fmt;

use crate::bitmap::BitmapBuilder;
use crate::column::{BoolColumn, Column, NativeType, TypedColumn};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::value::Value;

/// Name given to every mask column produced by evaluation.
pub const MASK_NAME: &str = "_mask";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Gt,
}

/// A boolean predicate over the rows of a [`Frame`].
///
/// Expressions are plain trees with no state; the same expression can be evaluated
/// against any frame that has the referenced columns with compatible types.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `column <op> value`, with the literal coerced to the column type.
    Comparison {
        column: String,
        op: ComparisonOp,
        value: Value,
    },
    /// Parity of the column value (see [`ColRef::even`]).
    Even { column: String },
    And { left: Box<Expr>, right: Box<Expr> },
    Or { left: Box<Expr>, right: Box<Expr> },
}

/// Entry point for building expressions on a named column.
#[derive(Debug, Clone)]
pub struct ColRef {
    name: String,
}

/// References a column by name.
///
/// ```
/// use oxyframe::{Column, Frame, col};
///
/// let frame = Frame::new(vec![Column::int64("age", [Some(10), None, Some(7), Some(42)])]).unwrap();
/// let mask = col("age").gt(9).evaluate(&frame).unwrap();
///
/// assert_eq!(mask.get(0), Some(&true));
/// assert_eq!(mask.get(1), None);
/// assert_eq!(mask.get(2), Some(&false));
/// ```
pub fn col(name: impl Into<String>) -> ColRef {
    ColRef { name: name.into() }
}

impl ColRef {
    pub fn eq(self, value: impl Into<Value>) -> Expr {
        Expr::Comparison {
            column: self.name,
            op: ComparisonOp::Eq,
            value: value.into(),
        }
    }

    pub fn gt(self, value: impl Into<Value>) -> Expr {
        Expr::Comparison {
            column: self.name,
            op: ComparisonOp::Gt,
            value: value.into(),
        }
    }

    /// True when the value is "even": integers by value, floats after truncation,
    /// strings by byte length, and booleans when `false`.
    pub fn even(self) -> Expr {
        Expr::Even { column: self.name }
    }
}

impl Expr {
    pub fn and(self, other: Expr) -> Expr {
        Expr::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Names of the columns the expression reads, in tree order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Expr::Comparison { column, .. } | Expr::Even { column } => vec![column.as_str()],
            Expr::And { left, right } | Expr::Or { left, right } => {
                let mut names = left.columns();
                names.extend(right.columns());
                names
            }
        }
    }

    /// Evaluates the expression into a mask row-aligned with `frame`.
    ///
    /// A row is null in the mask when the expression is undefined there: the source
    /// value is null, or (for `And`/`Or`) either operand is null. Note that this is
    /// not SQL logic: `false AND null` is null, not false.
    ///
    /// # Errors
    /// - [`Error::ColumnNotFound`] for an unknown column.
    /// - [`Error::Type`] when a literal cannot be coerced to the column type.
    /// - [`Error::Consistency`] when two operand masks differ in length.
    pub fn evaluate(&self, frame: &Frame) -> Result<BoolColumn> {
        match self {
            Expr::Comparison { column, op, value } => {
                compare(lookup(frame, column)?, *op, value)
            }
            Expr::Even { column } => Ok(even(lookup(frame, column)?)),
            Expr::And { left, right } => {
                combine(left.evaluate(frame)?, right.evaluate(frame)?, |l, r| l && r)
            }
            Expr::Or { left, right } => {
                combine(left.evaluate(frame)?, right.evaluate(frame)?, |l, r| l || r)
            }
        }
    }
}

fn lookup<'a>(frame: &'a Frame, name: &str) -> Result<&'a Column> {
    frame
        .column(name)
        .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
}

fn type_mismatch(column: &Column, value: &Value) -> Error {
    Error::Type(format!(
        "cannot compare {} column {:?} with literal {:?}",
        column.data_type(),
        column.name(),
        value
    ))
}

/// Maps every present row through `predicate`; null rows stay null.
fn map_present<T: NativeType>(
    column: &TypedColumn<T>,
    predicate: impl Fn(&T) -> bool,
) -> BoolColumn {
    let values = (0..column.len())
        .map(|i| column.get(i).is_some_and(&predicate))
        .collect();
    BoolColumn::from_parts(MASK_NAME, values, column.validity().clone())
}

fn compare(column: &Column, op: ComparisonOp, value: &Value) -> Result<BoolColumn> {
    // the literal is coerced once, before any row is looked at
    match column {
        Column::Int64(c) => {
            let rhs = value
                .coerce_i64()
                .ok_or_else(|| type_mismatch(column, value))?;
            Ok(map_present(c, |lhs| match op {
                ComparisonOp::Eq => *lhs == rhs,
                ComparisonOp::Gt => *lhs > rhs,
            }))
        }
        Column::Float64(c) => {
            let rhs = value
                .coerce_f64()
                .ok_or_else(|| type_mismatch(column, value))?;
            Ok(map_present(c, |lhs| match op {
                ComparisonOp::Eq => *lhs == rhs,
                ComparisonOp::Gt => *lhs > rhs,
            }))
        }
        Column::Utf8(c) => {
            let rhs = value.to_text().ok_or_else(|| type_mismatch(column, value))?;
            Ok(map_present(c, |lhs| match op {
                ComparisonOp::Eq => lhs.as_bytes() == rhs.as_bytes(),
                ComparisonOp::Gt => lhs.as_bytes() > rhs.as_bytes(),
            }))
        }
        Column::Bool(c) => {
            let rhs = value.as_bool().ok_or_else(|| type_mismatch(column, value))?;
            // true > false, mirroring the false-first sort order
            Ok(map_present(c, |lhs| match op {
                ComparisonOp::Eq => *lhs == rhs,
                ComparisonOp::Gt => *lhs && !rhs,
            }))
        }
    }
}

fn even(column: &Column) -> BoolColumn {
    match column {
        Column::Int64(c) => map_present(c, |v| v % 2 == 0),
        Column::Float64(c) => map_present(c, |v| (*v as i64) % 2 == 0),
        Column::Utf8(c) => map_present(c, |v| v.len() % 2 == 0),
        Column::Bool(c) => map_present(c, |v| !*v),
    }
}

/// Elementwise combination where a null on either side makes the row null.
fn combine(left: BoolColumn, right: BoolColumn, op: fn(bool, bool) -> bool) -> Result<BoolColumn> {
    if left.len() != right.len() {
        return Err(Error::Consistency(format!(
            "logical operands have {} and {} rows",
            left.len(),
            right.len()
        )));
    }
    let mut values = Vec::with_capacity(left.len());
    let mut validity = BitmapBuilder::with_capacity(left.len());
    for i in 0..left.len() {
        match (left.get(i), right.get(i)) {
            (Some(&l), Some(&r)) => {
                values.push(op(l, r));
                validity.append(true);
            }
            _ => {
                values.push(false);
                validity.append(false);
            }
        }
    }
    Ok(BoolColumn::from_parts(MASK_NAME, values, validity.finish()))
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Eq => f.write_str("=="),
            ComparisonOp::Gt => f.write_str(">"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Comparison { column, op, value } => match value {
                Value::Text(text) => write!(f, "{column} {op} {text:?}"),
                Value::Null => write!(f, "{column} {op} null"),
                other => write!(f, "{column} {op} {}", other.to_text().unwrap_or_default()),
            },
            Expr::Even { column } => write!(f, "even({column})"),
            Expr::And { left, right } => write!(f, "({left} AND {right})"),
            Expr::Or { left, right } => write!(f, "({left} OR {right})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![
            Column::int64("age", [Some(10), None, Some(7), Some(42)]),
            Column::float64("score", [Some(1.5), Some(3.9), None, Some(-2.0)]),
            Column::utf8("name", [Some("bob"), Some("al"), Some("zed"), None]),
            Column::boolean("active", [Some(true), Some(false), None, Some(true)]),
        ])
        .unwrap()
    }

    fn mask_values(mask: &BoolColumn) -> Vec<Option<bool>> {
        (0..mask.len()).map(|i| mask.get(i).copied()).collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Test 1 : Int64 comparisons
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_int_gt_propagates_null() {
        let mask = col("age").gt(9).evaluate(&frame()).unwrap();

        assert_eq!(mask.name(), MASK_NAME);
        assert_eq!(mask_values(&mask), vec![Some(true), None, Some(false), Some(true)]);
    }

    #[test]
    fn test_int_literal_coercion() {
        let f = frame();

        // float literal truncates to 9
        let mask = col("age").gt(9.8).evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), None, Some(false), Some(true)]);

        let mask = col("age").eq("42").evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), None, Some(false), Some(true)]);
    }

    #[test]
    fn test_int_literal_not_coercible() {
        let f = frame();

        let err = col("age").eq("forty").evaluate(&f).unwrap_err();
        assert!(matches!(err, Error::Type(_)));

        let err = col("age").eq(true).evaluate(&f).unwrap_err();
        assert!(matches!(err, Error::Type(_)));

        let err = col("age").eq(Value::Null).evaluate(&f).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_literal_checked_even_when_all_rows_null() {
        let f = Frame::new(vec![Column::int64("x", [None, None])]).unwrap();

        let err = col("x").gt("nope").evaluate(&f).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : Float64 comparisons
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_float_comparisons() {
        let f = frame();

        let mask = col("score").gt(1).evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), Some(true), None, Some(false)]);

        let mask = col("score").eq("-2").evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(false), None, Some(true)]);

        let err = col("score").gt(false).evaluate(&f).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_utf8_against_float_literal_uses_float_text() {
        let f = Frame::new(vec![Column::utf8("raw", [Some("1e+06"), Some("1000000"), None])]).unwrap();

        let mask = col("raw").eq(1e6).evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), Some(false), None]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : Utf8 comparisons
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_utf8_comparisons() {
        let f = frame();

        let mask = col("name").gt("b").evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), Some(false), Some(true), None]);

        let mask = col("name").eq("al").evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(true), Some(false), None]);

        // non-text literals compare through their text form
        let numbers = Frame::new(vec![Column::utf8("code", [Some("10"), Some("9")])]).unwrap();
        let mask = col("code").eq(10).evaluate(&numbers).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), Some(false)]);
        // byte order: "9" > "10"
        let mask = col("code").gt(10).evaluate(&numbers).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(true)]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : Bool comparisons
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_bool_comparisons() {
        let f = frame();

        let mask = col("active").eq(true).evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), Some(false), None, Some(true)]);

        // only true > false holds
        let mask = col("active").gt(false).evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), Some(false), None, Some(true)]);
        let mask = col("active").gt(true).evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(false), None, Some(false)]);

        let err = col("active").eq(1).evaluate(&f).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : parity predicate
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_even() {
        let f = frame();

        let mask = col("age").even().evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(true), None, Some(false), Some(true)]);

        // 1.5 -> 1, 3.9 -> 3, -2.0 -> -2
        let mask = col("score").even().evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(false), None, Some(true)]);

        let mask = col("name").even().evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(true), Some(false), None]);

        let mask = col("active").even().evaluate(&f).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(true), None, Some(false)]);

        let negative = Frame::new(vec![Column::int64("n", [Some(-3), Some(-4)])]).unwrap();
        let mask = col("n").even().evaluate(&negative).unwrap();
        assert_eq!(mask_values(&mask), vec![Some(false), Some(true)]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : AND / OR with null veto
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_and_or() {
        let f = Frame::new(vec![
            Column::boolean("a", [Some(true), Some(true), Some(false), Some(false), None]),
            Column::boolean("b", [Some(true), Some(false), Some(true), Some(false), Some(true)]),
        ])
        .unwrap();

        let mask = col("a").eq(true).and(col("b").eq(true)).evaluate(&f).unwrap();
        assert_eq!(
            mask_values(&mask),
            vec![Some(true), Some(false), Some(false), Some(false), None]
        );

        let mask = col("a").eq(true).or(col("b").eq(true)).evaluate(&f).unwrap();
        assert_eq!(
            mask_values(&mask),
            vec![Some(true), Some(true), Some(true), Some(false), None]
        );
    }

    #[test]
    fn test_null_vetoes_short_circuit_values() {
        let f = Frame::new(vec![
            Column::boolean("a", [Some(false), None]),
            Column::boolean("b", [None, Some(true)]),
        ])
        .unwrap();

        // false AND null is null, null OR true is null
        let and = col("a").eq(true).and(col("b").eq(true)).evaluate(&f).unwrap();
        assert_eq!(mask_values(&and), vec![None, None]);

        let or = col("a").eq(true).or(col("b").eq(true)).evaluate(&f).unwrap();
        assert_eq!(mask_values(&or), vec![None, None]);
    }

    #[test]
    fn test_combine_length_mismatch() {
        let left = BoolColumn::new(MASK_NAME, vec![true, false], None);
        let right = BoolColumn::new(MASK_NAME, vec![true], None);

        let err = combine(left, right, |l, r| l && r).unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 7 : lookup errors and reuse
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_unknown_column() {
        let expr = col("age").gt(1).and(col("missing").even());
        let err = expr.evaluate(&frame()).unwrap_err();

        assert!(matches!(err, Error::ColumnNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_expression_reusable_across_frames() {
        let expr = col("age").gt(9);
        let other = Frame::new(vec![Column::int64("age", [Some(100)])]).unwrap();

        assert_eq!(expr.evaluate(&frame()).unwrap().len(), 4);
        assert_eq!(mask_values(&expr.evaluate(&other).unwrap()), vec![Some(true)]);
    }

    #[test]
    fn test_columns_and_display() {
        let expr = col("a").gt(1).and(col("b").even().or(col("c").eq("x")));

        assert_eq!(expr.columns(), vec!["a", "b", "c"]);
        assert_eq!(expr.to_string(), r#"(a > 1 AND (even(b) OR c == "x"))"#);
    }
}
