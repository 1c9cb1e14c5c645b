use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::expr::Expr;
use crate::frame::Frame;
use crate::source::{ScanOptions, read_csv, read_json};

/// Where a deferred plan reads its base frame from.
#[derive(Debug, Clone)]
pub enum PlanSource {
    Csv { path: PathBuf, options: ScanOptions },
    Json { path: PathBuf },
    Frame(Arc<Frame>),
}

impl PlanSource {
    fn materialize(&self) -> Result<Frame> {
        match self {
            Self::Csv { path, options } => read_csv(path, options),
            Self::Json { path } => read_json(path),
            Self::Frame(frame) => Ok(Frame::clone(frame)),
        }
    }
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { path, .. } => write!(f, "csv({})", path.display()),
            Self::Json { path } => write!(f, "json({})", path.display()),
            Self::Frame(frame) => write!(f, "frame({}x{})", frame.height(), frame.width()),
        }
    }
}

/// One deferred operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOp {
    Select(Vec<String>),
    Filter(Expr),
    Sort { column: String, descending: bool },
}

impl PlanOp {
    pub fn is_filter(&self) -> bool {
        matches!(self, Self::Filter(_))
    }

    fn apply(&self, frame: &Frame) -> Result<Frame> {
        match self {
            Self::Select(names) => frame.select(names.as_slice()),
            Self::Filter(expr) => frame.filter(expr),
            Self::Sort { column, descending } => frame.sort_by(column, *descending),
        }
    }
}

impl fmt::Display for PlanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(names) => write!(f, "select({})", names.join(", ")),
            Self::Filter(expr) => write!(f, "filter({expr})"),
            Self::Sort { column, descending } => {
                let direction = if *descending { "desc" } else { "asc" };
                write!(f, "sort({column} {direction})")
            }
        }
    }
}

// Operations form a singly linked list from the newest back to the oldest, so a
// chained plan shares every earlier node with the plan it was built from.
#[derive(Debug)]
struct PlanNode {
    op: PlanOp,
    prev: Option<Arc<PlanNode>>,
}

// Unlinks the chain iteratively; the derived drop would recurse once per node.
// Stops at the first node still shared with another plan.
impl Drop for PlanNode {
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            prev = Arc::into_inner(node).and_then(|mut node| node.prev.take());
        }
    }
}

/// A deferred query: a source plus an ordered list of operations.
///
/// Chaining never modifies the receiver; each call returns a new plan, so partial
/// plans can be kept and branched freely. Nothing is read until [`collect`](Self::collect).
///
/// ```
/// use oxyframe::{Column, Frame, LazyFrame, col};
///
/// let frame = Frame::new(vec![Column::int64("x", [Some(3), Some(2), Some(4), None])]).unwrap();
/// let base = LazyFrame::from_frame(frame);
/// let evens = base.filter(col("x").even()).sort("x", true);
///
/// let out = evens.collect().unwrap();
/// assert_eq!(out.column("x").unwrap().value_string(0), "4");
/// assert_eq!(out.height(), 2);
/// assert_eq!(base.operations().len(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct LazyFrame {
    source: Arc<PlanSource>,
    tail: Option<Arc<PlanNode>>,
}

/// Starts a plan over a delimited text file.
pub fn scan_csv(path: impl Into<PathBuf>, options: ScanOptions) -> LazyFrame {
    LazyFrame::new(PlanSource::Csv {
        path: path.into(),
        options,
    })
}

/// Starts a plan over a JSON document.
pub fn scan_json(path: impl Into<PathBuf>) -> LazyFrame {
    LazyFrame::new(PlanSource::Json { path: path.into() })
}

impl LazyFrame {
    pub fn new(source: PlanSource) -> Self {
        Self {
            source: Arc::new(source),
            tail: None,
        }
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self::new(PlanSource::Frame(Arc::new(frame)))
    }

    pub fn source(&self) -> &PlanSource {
        &self.source
    }

    fn push(&self, op: PlanOp) -> Self {
        Self {
            source: Arc::clone(&self.source),
            tail: Some(Arc::new(PlanNode {
                op,
                prev: self.tail.clone(),
            })),
        }
    }

    #[must_use]
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        self.push(PlanOp::Select(
            names.iter().map(|name| name.as_ref().to_string()).collect(),
        ))
    }

    #[must_use]
    pub fn filter(&self, expr: Expr) -> Self {
        self.push(PlanOp::Filter(expr))
    }

    #[must_use]
    pub fn sort(&self, column: impl Into<String>, descending: bool) -> Self {
        self.push(PlanOp::Sort {
            column: column.into(),
            descending,
        })
    }

    /// Operations in the order they were declared.
    pub fn operations(&self) -> Vec<PlanOp> {
        let mut ops = Vec::new();
        let mut node = self.tail.as_deref();
        while let Some(current) = node {
            ops.push(current.op.clone());
            node = current.prev.as_deref();
        }
        ops.reverse();
        ops
    }

    /// Operations in execution order: every filter first, then the remaining
    /// operations, each group keeping its declared relative order.
    ///
    /// Filters only read row values of columns present in the scanned frame, so
    /// running them before projections and sorts yields the same rows in the same order.
    pub fn optimized_operations(&self) -> Vec<PlanOp> {
        let (mut filters, rest): (Vec<PlanOp>, Vec<PlanOp>) =
            self.operations().into_iter().partition(PlanOp::is_filter);
        filters.extend(rest);
        filters
    }

    /// Reads the source and runs the optimized operations.
    ///
    /// # Errors
    /// Returns the first error raised by the scan or by any operation.
    pub fn collect(self) -> Result<Frame> {
        let declared = self.operations();
        let optimized = self.optimized_operations();
        debug!(
            source = %self.source,
            declared = %render(&declared),
            optimized = %render(&optimized),
            "optimized plan"
        );

        let mut frame = self.source.materialize()?;
        debug!(height = frame.height(), width = frame.width(), "materialized source");
        for op in &optimized {
            frame = op.apply(&frame)?;
            debug!(op = %op, height = frame.height(), "executed plan step");
        }
        debug!(
            height = frame.height(),
            bytes = frame.allocated_bytes(),
            "collected frame"
        );
        Ok(frame)
    }
}

fn render(ops: &[PlanOp]) -> String {
    ops.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
