//! # Legend Configuration
//!
//! A flat set of named options, read once when the legend block is built.
//! Size options use `0` to mean "unbounded"; accessors resolve that to
//! `f64::INFINITY` so layout code never sees the sentinel.

use serde::{Deserialize, Serialize};

use crate::error::LegendError;
use crate::font::FontSpec;
use crate::model::{Edges, HorizontalAlignment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegendConfig {
    // ── Outer geometry ─────────────────────────────────────────
    /// Total width of the legend grid. 0 = unbounded.
    pub max_width: f64,
    /// Maximum height of a single column. 0 = unbounded.
    pub max_height: f64,
    /// Columns per page. `None` = unbounded.
    pub max_columns: Option<usize>,
    /// Padding around each column cell of the outer grid.
    pub column_margin: Edges,
    pub horizontal_alignment: HorizontalAlignment,
    /// Draw cell borders (debugging aid).
    pub borders: bool,
    /// Scale the finished grid into this box. 0 = derive from the other side.
    pub fit_width: f64,
    pub fit_height: f64,

    // ── Icons ──────────────────────────────────────────────────
    /// 0 = unbounded.
    pub icon_max_width: f64,
    /// 0 = unbounded.
    pub icon_max_height: f64,
    pub icon_padding: Edges,
    /// Default icon scale factor. 0 is treated as 1.
    pub scale: f64,
    pub icon_before_name: bool,

    // ── Labels ─────────────────────────────────────────────────
    /// 0 = unbounded.
    pub text_max_width: f64,
    pub text_padding: Edges,
    /// Right-align labels that follow their icon.
    pub inline: bool,
    pub layer_font: String,
    pub layer_font_size: f64,
    pub class_font: String,
    pub class_font_size: f64,
    /// Line height as a multiplier of the font size.
    pub line_height: f64,

    // ── Spacing ────────────────────────────────────────────────
    pub class_indentation: f64,
    /// Vertical space before every layer except the first.
    pub layer_space_before: f64,
    /// Vertical space after a layer row.
    pub layer_space: f64,
    /// Vertical space after a class row.
    pub class_space: f64,

    // ── Behaviour flags ────────────────────────────────────────
    #[serde(alias = "failOnBrokenIcon")]
    pub fail_on_broken_url: bool,
    /// Keep a layer and its classes together in one unsplittable block.
    pub dont_break_items: bool,
    /// Pack items into columns tallest-first instead of in input order.
    pub reorder_columns: bool,
    /// Spill columns beyond `max_columns` onto continuation pages.
    pub overflow: bool,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            max_width: 0.0,
            max_height: 0.0,
            max_columns: None,
            column_margin: Edges::default(),
            horizontal_alignment: HorizontalAlignment::Center,
            borders: false,
            fit_width: 0.0,
            fit_height: 0.0,
            icon_max_width: 0.0,
            icon_max_height: 8.0,
            icon_padding: Edges::default(),
            scale: 1.0,
            icon_before_name: true,
            text_max_width: 0.0,
            text_padding: Edges::default(),
            inline: true,
            layer_font: "Helvetica".to_string(),
            layer_font_size: 10.0,
            class_font: "Helvetica".to_string(),
            class_font_size: 8.0,
            line_height: 1.2,
            class_indentation: 20.0,
            layer_space_before: 5.0,
            layer_space: 5.0,
            class_space: 2.0,
            fail_on_broken_url: true,
            dont_break_items: false,
            reorder_columns: false,
            overflow: false,
        }
    }
}

fn unbounded_if_zero(v: f64) -> f64 {
    if v == 0.0 {
        f64::INFINITY
    } else {
        v
    }
}

impl LegendConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, LegendError> {
        let config: LegendConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values before any layout pass runs.
    pub fn validate(&self) -> Result<(), LegendError> {
        let non_negative = [
            ("maxWidth", self.max_width),
            ("maxHeight", self.max_height),
            ("fitWidth", self.fit_width),
            ("fitHeight", self.fit_height),
            ("iconMaxWidth", self.icon_max_width),
            ("iconMaxHeight", self.icon_max_height),
            ("scale", self.scale),
            ("textMaxWidth", self.text_max_width),
            ("layerFontSize", self.layer_font_size),
            ("classFontSize", self.class_font_size),
            ("classIndentation", self.class_indentation),
            ("layerSpaceBefore", self.layer_space_before),
            ("layerSpace", self.layer_space),
            ("classSpace", self.class_space),
        ];
        for (option, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(LegendError::invalid_config(option, value));
            }
        }
        if self.line_height <= 0.0 || !self.line_height.is_finite() {
            return Err(LegendError::invalid_config("lineHeight", self.line_height));
        }
        if self.max_columns == Some(0) {
            return Err(LegendError::invalid_config("maxColumns", 0));
        }
        let paddings = [
            ("columnMargin", &self.column_margin),
            ("iconPadding", &self.icon_padding),
            ("textPadding", &self.text_padding),
        ];
        for (option, edges) in paddings {
            if edges.any_negative() {
                return Err(LegendError::invalid_config(option, format!("{:?}", edges)));
            }
        }
        Ok(())
    }

    pub fn max_width(&self) -> f64 {
        unbounded_if_zero(self.max_width)
    }

    pub fn max_height(&self) -> f64 {
        unbounded_if_zero(self.max_height)
    }

    pub fn icon_max_width(&self) -> f64 {
        unbounded_if_zero(self.icon_max_width)
    }

    pub fn icon_max_height(&self) -> f64 {
        unbounded_if_zero(self.icon_max_height)
    }

    pub fn text_max_width(&self) -> f64 {
        unbounded_if_zero(self.text_max_width)
    }

    pub fn scale(&self) -> f64 {
        if self.scale == 0.0 {
            1.0
        } else {
            self.scale
        }
    }

    /// Columns one page may show.
    pub fn column_budget(&self) -> usize {
        self.max_columns.unwrap_or(usize::MAX)
    }

    /// Whether a fit-box is configured.
    pub fn has_fit_box(&self) -> bool {
        self.fit_width > 0.0 || self.fit_height > 0.0
    }

    pub fn layer_font(&self) -> FontSpec {
        FontSpec::from_name(&self.layer_font, self.layer_font_size)
    }

    pub fn class_font(&self) -> FontSpec {
        FontSpec::from_name(&self.class_font, self.class_font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        LegendConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_means_unbounded() {
        let config = LegendConfig::default();
        assert!(config.max_width().is_infinite());
        assert!(config.max_height().is_infinite());
        assert!(config.icon_max_width().is_infinite());
        assert_eq!(config.icon_max_height(), 8.0);
        assert_eq!(config.column_budget(), usize::MAX);
    }

    #[test]
    fn zero_scale_is_identity() {
        let config = LegendConfig {
            scale: 0.0,
            ..Default::default()
        };
        assert_eq!(config.scale(), 1.0);
    }

    #[test]
    fn rejects_negative_spacing() {
        let config = LegendConfig {
            class_space: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("classSpace"));
    }

    #[test]
    fn rejects_zero_max_columns() {
        let err = LegendConfig::from_json(r#"{"maxColumns": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            LegendError::InvalidConfig {
                option: "maxColumns",
                ..
            }
        ));
    }

    #[test]
    fn rejects_negative_padding() {
        let err = LegendConfig::from_json(r#"{"iconPadding": "1 -2"}"#).unwrap_err();
        assert!(err.to_string().contains("iconPadding"));
    }

    #[test]
    fn parses_camel_case_json() {
        let config = LegendConfig::from_json(
            r#"{
                "maxWidth": 400,
                "maxHeight": 120,
                "maxColumns": 3,
                "textPadding": "2 4",
                "horizontalAlignment": "Left",
                "failOnBrokenIcon": false,
                "reorderColumns": true,
                "overflow": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_width(), 400.0);
        assert_eq!(config.column_budget(), 3);
        assert_eq!(config.text_padding.left, 4.0);
        assert_eq!(config.horizontal_alignment, HorizontalAlignment::Left);
        assert!(!config.fail_on_broken_url);
        assert!(config.reorder_columns && config.overflow);
        // untouched options keep their defaults
        assert_eq!(config.class_indentation, 20.0);
    }

    #[test]
    fn fonts_carry_style_suffixes() {
        let config = LegendConfig {
            layer_font: "Helvetica-Bold".into(),
            ..Default::default()
        };
        let font = config.layer_font();
        assert_eq!(font.family, "Helvetica");
        assert_eq!(font.weight, 700);
        assert_eq!(font.size, 10.0);
    }
}
