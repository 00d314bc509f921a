//! Shared icon/label cell widths for one layout pass.

use serde::Serialize;

use super::item::WidthStats;
use crate::config::LegendConfig;

/// Slack for comparing sums of measured sizes.
pub(crate) const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellWidths {
    pub icon: f64,
    pub text: f64,
}

impl CellWidths {
    /// Optimum widths for columns at most `max_column_width` wide.
    ///
    /// The icon column never takes more than half the column and the two
    /// widths together never exceed it.
    pub fn optimum(stats: &WidthStats, config: &LegendConfig, max_column_width: f64) -> Self {
        let indent = config.class_indentation;
        let icon_cap = config.icon_max_width() + config.icon_padding.horizontal() + indent;
        let icon = (stats.max_icon_width + indent)
            .min(icon_cap)
            .min(max_column_width / 2.0);
        let text_cap = config.text_max_width() + config.text_padding.horizontal();
        let text = stats
            .max_label_width
            .min(text_cap)
            .min(max_column_width - icon);
        Self { icon, text }
    }

    pub fn total(&self) -> f64 {
        self.icon + self.text
    }

    pub fn fits(&self, column_width: f64) -> bool {
        self.total() <= column_width + EPSILON
    }
}

/// Width of one column when the grid holds `column_count` columns.
///
/// Never more columns than a page shows share the width, even when later
/// columns spill onto continuation pages.
pub fn column_width(config: &LegendConfig, column_count: usize) -> f64 {
    let sharing = column_count.clamp(1, config.column_budget());
    (config.max_width() / sharing as f64 - config.column_margin.horizontal()).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Edges;

    fn stats(icon: f64, label: f64) -> WidthStats {
        WidthStats {
            max_icon_width: icon,
            max_label_width: label,
        }
    }

    #[test]
    fn unbounded_column_keeps_natural_widths() {
        let w = CellWidths::optimum(&stats(10.0, 80.0), &LegendConfig::default(), f64::INFINITY);
        assert_eq!(w, CellWidths { icon: 30.0, text: 80.0 });
    }

    #[test]
    fn icon_never_takes_more_than_half() {
        let w = CellWidths::optimum(&stats(100.0, 80.0), &LegendConfig::default(), 60.0);
        assert_eq!(w.icon, 30.0);
        assert_eq!(w.text, 30.0);
        assert!(w.fits(60.0));
    }

    #[test]
    fn configured_maxima_cap_widths() {
        let config = LegendConfig {
            icon_max_width: 12.0,
            icon_padding: Edges::symmetric(0.0, 1.0),
            text_max_width: 40.0,
            ..Default::default()
        };
        let w = CellWidths::optimum(&stats(50.0, 90.0), &config, f64::INFINITY);
        assert_eq!(w.icon, 12.0 + 2.0 + 20.0);
        assert_eq!(w.text, 40.0);
    }

    #[test]
    fn column_width_shares_page_width() {
        let config = LegendConfig {
            max_width: 300.0,
            max_columns: Some(2),
            column_margin: Edges::symmetric(0.0, 5.0),
            ..Default::default()
        };
        assert_eq!(column_width(&config, 1), 290.0);
        assert_eq!(column_width(&config, 2), 140.0);
        // more columns than a page shows still share between two
        assert_eq!(column_width(&config, 5), 140.0);
        assert!(column_width(&LegendConfig::default(), 3).is_infinite());
    }

    #[test]
    fn widths_shrink_with_column_width() {
        let s = stats(30.0, 200.0);
        let config = LegendConfig::default();
        let mut previous = f64::INFINITY;
        for columns in 1..6 {
            let width = 600.0 / columns as f64;
            let w = CellWidths::optimum(&s, &config, width);
            assert!(w.fits(width));
            assert!(w.total() <= previous);
            previous = w.total();
        }
    }
}
