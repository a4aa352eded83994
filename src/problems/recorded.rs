//! Pre-recorded experiment tables.
//!
//! A [`ReplayTable`] holds rows measured before the optimizer ran, for
//! example a lab campaign. The first rows seed the run; remaining rows are
//! replayed batch by batch while the surrogate pipeline still runs for its
//! statistics. [`RecordedProblem`] exposes the same table through the
//! [`Problem`] trait by exact design lookup.

use crate::error::{Error, Result};
use crate::problem::{Bounds, Evaluation, Problem};

/// Rows taken from a [`ReplayTable`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableRows {
    /// Designs.
    pub x: Vec<Vec<f64>>,
    /// Objectives.
    pub y: Vec<Vec<f64>>,
    /// Uncertainty, when the table records it.
    pub rho: Option<Vec<Vec<f64>>>,
}

impl TableRows {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// An ordered table of recorded evaluations.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayTable {
    rows: TableRows,
}

impl ReplayTable {
    /// Creates a table, checking that all matrices line up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowCountMismatch`] or [`Error::DimensionMismatch`] for
    /// ragged input.
    pub fn new(x: Vec<Vec<f64>>, y: Vec<Vec<f64>>, rho: Option<Vec<Vec<f64>>>) -> Result<Self> {
        Error::check_rows("Y", x.len(), y.len())?;
        Error::check_columns("X", x.first().map_or(0, Vec::len), &x)?;
        let n_obj = y.first().map_or(0, Vec::len);
        Error::check_columns("Y", n_obj, &y)?;
        if let Some(r) = &rho {
            Error::check_rows("rho", x.len(), r.len())?;
            Error::check_columns("rho", n_obj, r)?;
        }
        Ok(Self {
            rows: TableRows { x, y, rho },
        })
    }

    /// Total number of recorded rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All recorded designs.
    #[must_use]
    pub fn x(&self) -> &[Vec<f64>] {
        &self.rows.x
    }

    /// All recorded objectives.
    #[must_use]
    pub fn y(&self) -> &[Vec<f64>] {
        &self.rows.y
    }

    /// Recorded uncertainty, if any.
    #[must_use]
    pub fn rho(&self) -> Option<&[Vec<f64>]> {
        self.rows.rho.as_deref()
    }

    /// The first `n` rows, used to seed a run.
    #[must_use]
    pub fn initial(&self, n: usize) -> TableRows {
        self.slice(0, n)
    }

    /// Rows remaining after `offset`.
    #[must_use]
    pub fn remaining(&self, offset: usize) -> usize {
        self.len().saturating_sub(offset)
    }

    /// Up to `count` rows starting at `offset`.
    #[must_use]
    pub fn slice(&self, offset: usize, count: usize) -> TableRows {
        let start = offset.min(self.len());
        let end = offset.saturating_add(count).min(self.len());
        TableRows {
            x: self.rows.x[start..end].to_vec(),
            y: self.rows.y[start..end].to_vec(),
            rho: self.rows.rho.as_ref().map(|r| r[start..end].to_vec()),
        }
    }

    fn find(&self, design: &[f64]) -> Option<usize> {
        self.rows.x.iter().position(|row| row.as_slice() == design)
    }
}

/// A [`ReplayTable`] seen as a [`Problem`].
///
/// `evaluate` only succeeds for designs that appear verbatim in the table.
#[derive(Clone, Debug)]
pub struct RecordedProblem {
    name: String,
    bounds: Bounds,
    table: ReplayTable,
}

impl RecordedProblem {
    /// Wrap `table`, using the component-wise range of its designs as bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] for an empty table.
    pub fn new(name: impl Into<String>, table: ReplayTable) -> Result<Self> {
        let Some(first) = table.x().first() else {
            return Err(Error::EmptyDataset);
        };
        let mut xl = first.clone();
        let mut xu = first.clone();
        for row in table.x() {
            for (j, &v) in row.iter().enumerate() {
                xl[j] = xl[j].min(v);
                xu[j] = xu[j].max(v);
            }
        }
        Ok(Self {
            name: name.into(),
            bounds: Bounds::new(xl, xu)?,
            table,
        })
    }

    /// Replace the inferred bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the width differs from the table.
    pub fn with_bounds(mut self, bounds: Bounds) -> Result<Self> {
        Error::check_columns("bounds", self.bounds.n_var(), core::slice::from_ref(&bounds.xl))?;
        self.bounds = bounds;
        Ok(self)
    }

    /// The underlying table.
    #[must_use]
    pub fn table(&self) -> &ReplayTable {
        &self.table
    }
}

impl Problem for RecordedProblem {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_obj(&self) -> usize {
        self.table.y().first().map_or(0, Vec::len)
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn evaluate(&self, x: &[Vec<f64>]) -> Result<Evaluation> {
        let indices = x
            .iter()
            .map(|row| {
                self.table
                    .find(row)
                    .ok_or_else(|| Error::UnrecordedDesign(row.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Evaluation {
            f: indices.iter().map(|&i| self.table.y()[i].clone()).collect(),
            g: None,
            rho: self
                .table
                .rho()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect()),
        })
    }
}
