//! # Column Allocation
//!
//! Places item groups into columns bounded by `maxHeight`.
//!
//! Two algorithms:
//! - **Sequential fill** walks groups in input order and opens a new column
//!   whenever the next group would overflow the current one.
//! - **First-fit-descending** measures every group, sorts tallest first and
//!   drops each into the first column with room.
//!
//! Column width depends on how many columns share the page, and cell widths
//! depend on column width. Both algorithms therefore run inside a
//! [`LayoutAttempt`] loop: when the columns produced are narrower than the
//! cell widths the attempt assumed, the widths are recomputed for the new
//! column width and the pass starts over. Widths never grow between
//! attempts, so the loop settles after at most one restart per group.

use serde::Serialize;

use super::item::{ItemGroup, WidthStats};
use super::widths::{column_width, CellWidths, EPSILON};
use crate::config::LegendConfig;
use crate::error::LegendError;

/// Reports the rendered height of a group at the given cell widths.
pub trait HeightSource {
    fn height(&mut self, group: &ItemGroup, widths: CellWidths) -> Result<f64, LegendError>;
}

impl<F> HeightSource for F
where
    F: FnMut(&ItemGroup, CellWidths) -> Result<f64, LegendError>,
{
    fn height(&mut self, group: &ItemGroup, widths: CellWidths) -> Result<f64, LegendError> {
        self(group, widths)
    }
}

/// The widths one layout pass runs with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAttempt {
    pub column_width: f64,
    pub widths: CellWidths,
}

impl LayoutAttempt {
    pub fn new(stats: &WidthStats, config: &LegendConfig, column_width: f64) -> Self {
        Self {
            column_width,
            widths: CellWidths::optimum(stats, config, column_width),
        }
    }
}

/// A placed group with its measured height.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnEntry {
    pub group: ItemGroup,
    pub height: f64,
}

/// Groups stacked top to bottom, all sharing one set of cell widths.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub widths: CellWidths,
    pub entries: Vec<ColumnEntry>,
    pub height: f64,
}

impl Column {
    pub fn new(widths: CellWidths) -> Self {
        Self {
            widths,
            entries: Vec::new(),
            height: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, group: ItemGroup, height: f64) {
        self.height += height;
        self.entries.push(ColumnEntry { group, height });
    }

    /// Whether `height` more still fits under `max_height`.
    pub fn has_room(&self, height: f64, max_height: f64) -> bool {
        self.height + height <= max_height + EPSILON
    }

    /// Width of the widest row, zero when empty.
    pub fn content_width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.widths.total()
        }
    }

    /// Number of legend rows in the column.
    pub fn row_count(&self) -> usize {
        self.entries.iter().map(|e| e.group.rows.len()).sum()
    }
}

/// Owns the columns of one sequential pass.
pub struct ColumnAllocator {
    widths: CellWidths,
    closed: Vec<Column>,
    current: Column,
}

impl ColumnAllocator {
    pub fn new(widths: CellWidths) -> Self {
        Self {
            widths,
            closed: Vec::new(),
            current: Column::new(widths),
        }
    }

    pub fn add_item(&mut self, group: ItemGroup, height: f64) {
        self.current.push(group, height);
    }

    /// Close the current column and start an empty one. Empty columns are
    /// never closed.
    pub fn close_column(&mut self) {
        if !self.current.is_empty() {
            let full = std::mem::replace(&mut self.current, Column::new(self.widths));
            self.closed.push(full);
        }
    }

    pub fn current(&self) -> &Column {
        &self.current
    }

    /// Columns holding at least one group.
    pub fn column_count(&self) -> usize {
        self.closed.len() + usize::from(!self.current.is_empty())
    }

    pub fn finish(mut self) -> Vec<Column> {
        self.close_column();
        self.closed
    }
}

enum Outcome {
    Placed(Vec<Column>),
    Restart(LayoutAttempt),
}

fn run_attempts(
    groups: &[ItemGroup],
    stats: &WidthStats,
    config: &LegendConfig,
    mut pass: impl FnMut(LayoutAttempt) -> Result<Outcome, LegendError>,
) -> Result<Vec<Column>, LegendError> {
    let max_attempts = groups.len() + 2;
    let mut attempt = LayoutAttempt::new(stats, config, column_width(config, 1));
    for n in 0..max_attempts {
        log::debug!(
            "Layout attempt {}: column width {:.2}, icon {:.2}, text {:.2}",
            n + 1,
            attempt.column_width,
            attempt.widths.icon,
            attempt.widths.text
        );
        match pass(attempt)? {
            Outcome::Placed(columns) => {
                log::debug!("Placed {} groups in {} columns", groups.len(), columns.len());
                return Ok(columns);
            }
            Outcome::Restart(next) => attempt = next,
        }
    }
    Err(LegendError::NotConverged {
        attempts: max_attempts,
    })
}

/// Fill columns in input order.
pub fn sequential_fill(
    groups: &[ItemGroup],
    stats: &WidthStats,
    config: &LegendConfig,
    heights: &mut dyn HeightSource,
) -> Result<Vec<Column>, LegendError> {
    let max_height = config.max_height();
    run_attempts(groups, stats, config, |attempt| {
        let mut alloc = ColumnAllocator::new(attempt.widths);
        for group in groups {
            let height = heights.height(group, attempt.widths)?;
            if alloc.current().has_room(height, max_height) || alloc.current().is_empty() {
                alloc.add_item(group.clone(), height);
                continue;
            }

            alloc.close_column();
            let width = column_width(config, alloc.column_count() + 1);
            if !attempt.widths.fits(width) {
                log::debug!(
                    "Column {} narrows columns to {:.2}; restarting",
                    alloc.column_count() + 1,
                    width
                );
                return Ok(Outcome::Restart(LayoutAttempt::new(stats, config, width)));
            }
            match group.trimmed_for_column_top() {
                Some(trimmed) => {
                    let height = heights.height(&trimmed, attempt.widths)?;
                    alloc.add_item(trimmed, height);
                }
                None => alloc.add_item(group.clone(), height),
            }
        }
        Ok(Outcome::Placed(alloc.finish()))
    })
}

/// First-fit-descending bin packing over at most `target_columns` columns.
///
/// Groups that fit nowhere are placed afterwards: a group taller than
/// `maxHeight` gets a column of its own, the rest go first-fit into extra
/// columns after the targets.
pub fn first_fit_descending(
    groups: &[ItemGroup],
    stats: &WidthStats,
    config: &LegendConfig,
    target_columns: usize,
    heights: &mut dyn HeightSource,
) -> Result<Vec<Column>, LegendError> {
    let max_height = config.max_height();
    let target = target_columns.min(groups.len());
    run_attempts(groups, stats, config, |attempt| {
        let measured = groups
            .iter()
            .map(|g| heights.height(g, attempt.widths))
            .collect::<Result<Vec<_>, _>>()?;

        // Stable: equal heights keep input order.
        let mut order: Vec<usize> = (0..groups.len()).collect();
        order.sort_by(|&a, &b| measured[b].total_cmp(&measured[a]));

        let mut bins: Vec<Column> = (0..target).map(|_| Column::new(attempt.widths)).collect();
        let mut not_fitted = Vec::new();
        for &i in &order {
            match bins.iter_mut().find(|c| c.has_room(measured[i], max_height)) {
                Some(column) => column.push(groups[i].clone(), measured[i]),
                None => not_fitted.push(i),
            }
        }
        bins.retain(|c| !c.is_empty());

        let placed = bins.len();
        for i in not_fitted {
            let fits_any = measured[i] <= max_height + EPSILON;
            let spare = bins[placed..]
                .iter_mut()
                .find(|c| fits_any && c.has_room(measured[i], max_height));
            match spare {
                Some(column) => column.push(groups[i].clone(), measured[i]),
                None => {
                    let mut column = Column::new(attempt.widths);
                    column.push(groups[i].clone(), measured[i]);
                    bins.push(column);
                }
            }
        }

        let width = column_width(config, bins.len());
        if !attempt.widths.fits(width) {
            log::debug!("{} columns narrow columns to {:.2}; repacking", bins.len(), width);
            return Ok(Outcome::Restart(LayoutAttempt::new(stats, config, width)));
        }
        Ok(Outcome::Placed(bins))
    })
}
