//! # Legend Grid
//!
//! Wraps finished columns into the outer grid, one cell per column, and
//! optionally scales the result into a fit-box.

use serde::Serialize;

use super::columns::Column;
use crate::config::LegendConfig;
use crate::model::{Edges, HorizontalAlignment};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GridCell {
    Content { column: Column },
    /// Empty cell that keeps the grid rectangular.
    Filler,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendGrid {
    pub columns_per_row: usize,
    pub cells: Vec<GridCell>,
    pub column_padding: Edges,
    pub borders: bool,
    pub alignment: HorizontalAlignment,
    /// Natural size before any fit-box scaling.
    pub width: f64,
    pub height: f64,
}

impl LegendGrid {
    /// Lay `columns` out row by row, at most one page budget per row.
    ///
    /// Without overflow pagination a column count that does not divide
    /// evenly by `maxColumns` is padded with filler cells.
    pub fn assemble(columns: Vec<Column>, config: &LegendConfig) -> Self {
        let budget = config.column_budget();
        let count = columns.len();
        let columns_per_row = count.min(budget).max(1);
        let fillers = if !config.overflow && count > budget && count % budget != 0 {
            budget - count % budget
        } else {
            0
        };

        let mut cells: Vec<GridCell> = columns
            .into_iter()
            .map(|column| GridCell::Content { column })
            .collect();
        cells.extend(std::iter::repeat_with(|| GridCell::Filler).take(fillers));

        let mut grid = Self {
            columns_per_row,
            cells,
            column_padding: config.column_margin,
            borders: config.borders,
            alignment: config.horizontal_alignment,
            width: 0.0,
            height: 0.0,
        };
        grid.width = if config.max_width().is_finite() {
            config.max_width()
        } else {
            grid.natural_width()
        };
        grid.height = grid.natural_height();
        grid
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, GridCell> {
        self.cells.chunks(self.columns_per_row)
    }

    pub fn content_columns(&self) -> impl Iterator<Item = &Column> {
        self.cells.iter().filter_map(|cell| match cell {
            GridCell::Content { column } => Some(column),
            GridCell::Filler => None,
        })
    }

    pub fn filler_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, GridCell::Filler))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn natural_width(&self) -> f64 {
        let pad = self.column_padding.horizontal();
        self.rows()
            .next()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        GridCell::Content { column } => column.content_width() + pad,
                        GridCell::Filler => pad,
                    })
                    .sum()
            })
            .unwrap_or(0.0)
    }

    fn natural_height(&self) -> f64 {
        let pad = self.column_padding.vertical();
        self.rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        GridCell::Content { column } => column.height + pad,
                        GridCell::Filler => pad,
                    })
                    .fold(0.0, f64::max)
            })
            .sum()
    }
}

/// A grid scaled into a fit-box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaledLegend {
    pub grid: LegendGrid,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl ScaledLegend {
    /// Scale `grid` to fit `fit_width`×`fit_height`, keeping its aspect
    /// ratio. A zero side is derived from the other through that ratio.
    pub fn fit(grid: LegendGrid, fit_width: f64, fit_height: f64) -> Self {
        let (w, h) = (grid.width, grid.height);
        if w <= 0.0 || h <= 0.0 {
            return Self {
                width: w,
                height: h,
                scale: 1.0,
                grid,
            };
        }
        let aspect = w / h;
        let box_width = if fit_width > 0.0 { fit_width } else { aspect * fit_height };
        let box_height = if fit_height > 0.0 { fit_height } else { box_width / aspect };
        let scale = (box_width / w).min(box_height / h);
        Self {
            width: w * scale,
            height: h * scale,
            scale,
            grid,
        }
    }
}
