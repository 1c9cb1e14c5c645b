use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::column::{BoolColumn, Column, NativeType, TypedColumn, dispatch};
use crate::data_type::DataType;
use crate::error::{ConstructionError, Error, Result};
use crate::expr::Expr;
use crate::value::Value;

/// Column definition in the schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

/// An ordered, named set of equal-length columns.
///
/// Frames are immutable: [`Frame::select`], [`Frame::filter`] and [`Frame::sort_by`]
/// return a new frame and leave `self` untouched. Columns are shared between frames
/// through [`Arc`], so a projection never copies column data.
#[derive(Debug, Clone)]
pub struct Frame {
    columns: Vec<Arc<Column>>,
    index: HashMap<String, usize>,
    row_count: usize,
}

impl Frame {
    /// Validates and assembles a frame.
    ///
    /// # Errors
    /// Returns [`Error::Construction`] if no column is given, if a column length differs
    /// from the first column's length, or if two columns share a name.
    ///
    /// # Example
    /// ```
    /// use oxyframe::{Column, Frame};
    ///
    /// let frame = Frame::new(vec![
    ///     Column::int64("id", [Some(1), Some(2)]),
    ///     Column::utf8("name", [Some("Alice"), None]),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(frame.height(), 2);
    /// assert_eq!(frame.width(), 2);
    /// assert!(frame.column("name").unwrap().is_null(1));
    /// ```
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        Self::from_shared(columns.into_iter().map(Arc::new).collect())
    }

    fn from_shared(columns: Vec<Arc<Column>>) -> Result<Self> {
        let first = columns.first().ok_or(ConstructionError::NoColumns)?;
        let row_count = first.len();
        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if column.len() != row_count {
                return Err(ConstructionError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    found: column.len(),
                }
                .into());
            }
            if index.insert(column.name().to_string(), position).is_some() {
                return Err(ConstructionError::DuplicateColumn(column.name().to_string()).into());
            }
        }
        Ok(Self {
            columns,
            index,
            row_count,
        })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(|column| &**column)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &*self.columns[i])
    }

    pub fn schema(&self) -> Schema {
        Schema {
            columns: self
                .columns()
                .map(|column| ColumnDef {
                    name: column.name().to_string(),
                    data_type: column.data_type(),
                })
                .collect(),
        }
    }

    pub fn get_row(&self, row_idx: usize) -> Option<Vec<Value>> {
        if self.row_count <= row_idx {
            return None;
        }
        self.columns().map(|col| col.get(row_idx)).collect()
    }

    /// Heap bytes held by the columns' value arrays and validity bitmaps.
    ///
    /// Columns shared with other frames are counted in full; shared string payloads are not.
    pub fn allocated_bytes(&self) -> usize {
        self.columns()
            .map(|column| allocative::size_of_unique_allocated_data(column))
            .sum()
    }

    fn lookup(&self, name: &str) -> Result<&Arc<Column>> {
        self.index
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Projects the named columns in the given order. Rows are unchanged.
    ///
    /// # Errors
    /// Returns [`Error::ColumnNotFound`] if any name is absent, and
    /// [`Error::Construction`] if a name is repeated or the list is empty.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| self.lookup(name.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Self::from_shared(columns)
    }

    /// Keeps the rows where `expr` evaluates to true. Rows where it is false or null
    /// are dropped.
    pub fn filter(&self, expr: &Expr) -> Result<Self> {
        let mask = expr.evaluate(self)?;
        self.filter_mask(&mask)
    }

    /// Applies an already evaluated mask to every column.
    ///
    /// # Errors
    /// Returns [`Error::Consistency`] if the mask is not row-aligned with the frame.
    pub fn filter_mask(&self, mask: &BoolColumn) -> Result<Self> {
        if mask.len() != self.row_count {
            return Err(Error::Consistency(format!(
                "mask has {} rows, frame has {}",
                mask.len(),
                self.row_count
            )));
        }
        let keep: Vec<bool> = (0..mask.len()).map(|i| mask.get(i) == Some(&true)).collect();
        let columns = self
            .columns
            .iter()
            .map(|column| Arc::new(column.filter(&keep)))
            .collect();
        let filtered = Self::from_shared(columns)?;
        trace!(
            rows_in = self.row_count,
            rows_out = filtered.row_count,
            "filtered frame"
        );
        Ok(filtered)
    }

    /// Stable sort of the rows by one column.
    ///
    /// Null keys always go last, whatever the direction, and keep their original
    /// relative order, as do equal keys.
    ///
    /// # Errors
    /// Returns [`Error::ColumnNotFound`] if `column` is absent.
    pub fn sort_by(&self, column: &str, descending: bool) -> Result<Self> {
        let key = self.lookup(column)?;
        let order = dispatch!(&**key, c => sort_order(c, descending));
        trace!(column, descending, rows = order.len(), "sorting frame");
        let columns = self
            .columns
            .iter()
            .map(|column| Arc::new(column.take(&order)))
            .collect();
        Self::from_shared(columns)
    }
}

/// Computes the row permutation that sorts `key`, nulls last.
fn sort_order<T: NativeType>(key: &TypedColumn<T>, descending: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..key.len()).collect();
    // slice::sort_by is stable, so ties and null pairs keep their original order
    order.sort_by(|&a, &b| match (key.get(a), key.get(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = x.compare(y);
            if descending { ord.reverse() } else { ord }
        }
    });
    order
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.row_count == other.row_count
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a == b)
    }
}
