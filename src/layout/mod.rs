//! # Legend Layout
//!
//! A legend is a list of layers, each with its classes, and every row has
//! an optional icon and a label. Laying it out means:
//!
//! 1. Build rows and measure their natural widths ([`item`])
//! 2. Pick shared icon and label cell widths ([`widths`])
//! 3. Stack rows into columns no taller than `maxHeight` ([`columns`])
//! 4. Keep as many columns as one page shows and queue the rest for
//!    continuation pages ([`overflow`])
//! 5. Wrap the columns into the outer grid, scaled into a fit-box when one
//!    is configured ([`grid`])
//!
//! [`LegendBlock`] runs these steps once per page. On a continuation page
//! it skips straight to draining the queue.

pub mod columns;
pub mod grid;
pub mod item;
pub mod overflow;
pub mod widths;

use serde::Serialize;

use crate::config::LegendConfig;
use crate::error::LegendError;
use crate::measure::{MeasurementAdapter, Typesetter};
use crate::model::{LegendEntry, PageGeometry};
use crate::page::{ContinuationRequest, PageSequencer};

use columns::{first_fit_descending, sequential_fill, Column};
use grid::{LegendGrid, ScaledLegend};
use item::ItemBuilder;
use overflow::OverflowQueue;

/// What a legend block contributes to a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Artifact {
    Grid(LegendGrid),
    Scaled(ScaledLegend),
}

impl Artifact {
    pub fn grid(&self) -> &LegendGrid {
        match self {
            Artifact::Grid(grid) => grid,
            Artifact::Scaled(scaled) => &scaled.grid,
        }
    }
}

/// A configured legend, rendered once per page.
///
/// The block keeps the columns that did not fit on the last page it
/// rendered; at most one render may be in flight at a time.
#[derive(Debug)]
pub struct LegendBlock {
    config: LegendConfig,
    pending: OverflowQueue,
}

impl LegendBlock {
    /// Validates `config` before any layout runs.
    pub fn new(config: LegendConfig) -> Result<Self, LegendError> {
        config.validate()?;
        Ok(Self {
            config,
            pending: OverflowQueue::new(),
        })
    }

    pub fn config(&self) -> &LegendConfig {
        &self.config
    }

    /// Whether columns are waiting for a continuation page.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_columns(&self) -> usize {
        self.pending.len()
    }

    /// Take up to `budget` pending columns without rendering.
    pub fn next_pending_batch(&mut self, budget: usize) -> (Vec<Column>, bool) {
        self.pending.next_pending_batch(budget)
    }

    /// Render the legend for the sequencer's current page.
    ///
    /// With overflow enabled, columns beyond `maxColumns` are queued and a
    /// continuation page is scheduled after the current one. A later call
    /// drains the queue instead of laying `layers` out again.
    pub fn render(
        &mut self,
        layers: &[LegendEntry],
        typesetter: &dyn Typesetter,
        pages: &mut dyn PageSequencer,
    ) -> Result<Artifact, LegendError> {
        let budget = self.config.column_budget();

        let (columns, has_more) = if self.config.overflow && self.has_pending() {
            let (columns, has_more) = self.pending.next_pending_batch(budget);
            log::debug!(
                "Draining {} pending columns, {} left",
                columns.len(),
                self.pending.len()
            );
            (columns, has_more)
        } else {
            let mut columns = self.layout(layers, typesetter, &pages.current_page())?;
            if self.config.overflow && columns.len() > budget {
                self.pending.defer(columns.split_off(budget));
            }
            (columns, self.has_pending())
        };

        if has_more {
            let request = ContinuationRequest::after(pages);
            log::info!(
                "Legend continues after page {}: {} columns pending",
                request.after_page,
                self.pending.len()
            );
            pages.schedule_continuation(request);
        }

        let grid = LegendGrid::assemble(columns, &self.config);
        Ok(if self.config.has_fit_box() {
            Artifact::Scaled(ScaledLegend::fit(
                grid,
                self.config.fit_width,
                self.config.fit_height,
            ))
        } else {
            Artifact::Grid(grid)
        })
    }

    /// One full layout pass: every column the legend needs, ignoring the
    /// page budget.
    pub fn layout(
        &self,
        layers: &[LegendEntry],
        typesetter: &dyn Typesetter,
        page: &PageGeometry,
    ) -> Result<Vec<Column>, LegendError> {
        let config = &self.config;
        let (groups, stats) = ItemBuilder::new(config, typesetter).build(layers)?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let target_columns = if config.overflow {
            usize::MAX
        } else {
            config.column_budget()
        };
        let reorder = config.reorder_columns && target_columns != 1;

        let mut heights = MeasurementAdapter::new(typesetter, *page);
        let columns = if reorder {
            first_fit_descending(&groups, &stats, config, target_columns, &mut heights)?
        } else {
            sequential_fill(&groups, &stats, config, &mut heights)?
        };
        heights.finish()?;
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Engine;
    use crate::page::{PagePosition, PageRun};

    fn layers(n: usize) -> Vec<LegendEntry> {
        (0..n).map(|i| LegendEntry::named(&format!("Layer {}", i))).collect()
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = LegendConfig {
            max_columns: Some(0),
            ..Default::default()
        };
        assert!(LegendBlock::new(config).is_err());
    }

    #[test]
    fn empty_legend_renders_empty_grid() {
        let engine = Engine::new();
        let mut block = LegendBlock::new(LegendConfig::default()).unwrap();
        let mut run = PageRun::new(PageGeometry::default(), PagePosition::MainPage);
        let artifact = block.render(&[], &engine, &mut run).unwrap();
        assert!(artifact.grid().is_empty());
        assert!(run.requests().is_empty());
    }

    #[test]
    fn unbounded_height_gives_one_column() {
        let engine = Engine::new();
        let block = LegendBlock::new(LegendConfig::default()).unwrap();
        let columns = block
            .layout(&layers(12), &engine, &PageGeometry::default())
            .unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].row_count(), 12);
    }

    #[test]
    fn overflow_queues_excess_columns() {
        let engine = Engine::new();
        let config = LegendConfig {
            max_height: 20.0,
            max_columns: Some(2),
            overflow: true,
            ..Default::default()
        };
        let mut block = LegendBlock::new(config).unwrap();
        let mut run = PageRun::new(PageGeometry::default(), PagePosition::MainPage);
        let artifact = block.render(&layers(5), &engine, &mut run).unwrap();
        assert_eq!(artifact.grid().content_columns().count(), 2);
        assert!(block.has_pending());
        assert_eq!(run.requests().len(), 1);

        let (rest, more) = block.next_pending_batch(usize::MAX);
        assert!(!rest.is_empty());
        assert!(!more);
    }

    #[test]
    fn fit_box_scales_the_grid() {
        let engine = Engine::new();
        let config = LegendConfig {
            fit_width: 50.0,
            ..Default::default()
        };
        let mut block = LegendBlock::new(config).unwrap();
        let mut run = PageRun::new(PageGeometry::default(), PagePosition::MainPage);
        match block.render(&layers(3), &engine, &mut run).unwrap() {
            Artifact::Scaled(scaled) => {
                assert!((scaled.width - 50.0).abs() < 1e-9);
                let aspect = scaled.grid.width / scaled.grid.height;
                assert!((scaled.width / scaled.height - aspect).abs() < 1e-9);
            }
            Artifact::Grid(_) => panic!("expected a scaled legend"),
        }
        // configuration is left untouched
        assert_eq!(block.config().fit_height, 0.0);
    }
}
