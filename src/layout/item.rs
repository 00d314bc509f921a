//! # Legend Items
//!
//! Turns layer and class records into rows with resolved padding and
//! measured natural widths. A row with neither icon nor color is a single
//! merged cell; every other row is an icon cell plus a label cell.
//!
//! Rows are grouped into [`ItemGroup`]s, the unit the column allocator
//! places. By default every row is its own group; with `dontBreakItems` a
//! layer and all of its classes form one unsplittable group.

use serde::Serialize;

use super::widths::CellWidths;
use crate::config::LegendConfig;
use crate::error::LegendError;
use crate::font::FontSpec;
use crate::icon::{IconBox, IconImage};
use crate::measure::Typesetter;
use crate::model::{Edges, LegendEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Layer,
    Class,
}

/// What sits in a row's icon cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IconContent {
    None,
    Image { icon: IconImage },
    /// Several icons side by side, each with its own horizontal padding.
    Strip { icons: Vec<IconImage> },
    Swatch { icon: IconImage },
}

impl IconContent {
    pub fn is_none(&self) -> bool {
        matches!(self, IconContent::None)
    }

    fn icons(&self) -> &[IconImage] {
        match self {
            IconContent::None => &[],
            IconContent::Image { icon } | IconContent::Swatch { icon } => std::slice::from_ref(icon),
            IconContent::Strip { icons } => icons,
        }
    }

    /// Natural width including `padding` around every icon.
    pub fn natural_width(&self, padding: &Edges) -> f64 {
        self.icons()
            .iter()
            .map(|icon| icon.width + padding.horizontal())
            .sum()
    }

    /// Height of the tallest icon.
    pub fn height(&self) -> f64 {
        self.icons().iter().map(|icon| icon.height).fold(0.0, f64::max)
    }
}

/// A cell of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Icon,
    Label,
    /// Label spanning the icon and label columns.
    Merged,
}

/// One legend row: a layer header or one of its classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub depth: Depth,
    pub label: String,
    pub font: FontSpec,
    /// Line height as a multiplier of the font size.
    pub line_height: f64,
    pub icon: IconContent,
    pub icon_before_label: bool,
    pub align_label_right: bool,
    pub space_before: f64,
    pub space_after: f64,
    /// Resolved icon cell padding (spacing and indentation included).
    pub icon_padding: Edges,
    /// Resolved label cell padding (spacing and indentation included).
    pub text_padding: Edges,
    /// Natural width of the icon cell content plus icon padding.
    pub icon_width: f64,
    /// Natural width of the label plus text padding.
    pub label_width: f64,
}

impl Item {
    pub fn is_merged(&self) -> bool {
        self.icon.is_none()
    }

    /// Cells left to right with their widths for a layout pass.
    pub fn cells(&self, widths: CellWidths) -> Vec<(CellKind, f64)> {
        if self.is_merged() {
            vec![(CellKind::Merged, widths.total())]
        } else if self.icon_before_label {
            vec![(CellKind::Icon, widths.icon), (CellKind::Label, widths.text)]
        } else {
            vec![(CellKind::Label, widths.text), (CellKind::Icon, widths.icon)]
        }
    }

    /// Width available to the label text once padding is taken off.
    pub fn label_space(&self, widths: CellWidths) -> f64 {
        let cell = if self.is_merged() {
            widths.total()
        } else {
            widths.text
        };
        (cell - self.text_padding.horizontal()).max(0.0)
    }
}

/// The unit the column allocator places: one row, or a layer with its
/// classes when items must not be broken apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemGroup {
    /// Position among the groups of one layout pass.
    pub index: usize,
    pub rows: Vec<Item>,
    /// Top spacing was removed because the group opens a column.
    pub trimmed: bool,
}

impl ItemGroup {
    pub fn space_before(&self) -> f64 {
        self.rows.first().map_or(0.0, |row| row.space_before)
    }

    /// This group with its leading space removed, for use at the top of a
    /// column. `None` when there is nothing to remove.
    pub fn trimmed_for_column_top(&self) -> Option<ItemGroup> {
        let first = self.rows.first()?;
        let space = first.space_before;
        if space <= 0.0 || first.text_padding.top.max(first.icon_padding.top) <= 0.0 {
            return None;
        }
        let mut group = self.clone();
        let row = &mut group.rows[0];
        row.text_padding.top = (row.text_padding.top - space).max(0.0);
        if !row.icon.is_none() {
            row.icon_padding.top = (row.icon_padding.top - space).max(0.0);
        }
        row.space_before = 0.0;
        group.trimmed = true;
        Some(group)
    }
}

/// Widest icon cell and label seen while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidthStats {
    pub max_icon_width: f64,
    pub max_label_width: f64,
}

impl WidthStats {
    fn record(&mut self, item: &Item) {
        self.max_icon_width = self.max_icon_width.max(item.icon_width);
        self.max_label_width = self.max_label_width.max(item.label_width);
    }
}

/// Per-row settings that differ between layers and classes.
struct RowStyle {
    depth: Depth,
    indent: f64,
    font: FontSpec,
    space_before: f64,
    space_after: f64,
    default_icon_before: bool,
}

/// Builds item groups from legend records.
pub struct ItemBuilder<'a> {
    config: &'a LegendConfig,
    typesetter: &'a dyn Typesetter,
    stats: WidthStats,
    groups: Vec<ItemGroup>,
}

impl<'a> ItemBuilder<'a> {
    pub fn new(config: &'a LegendConfig, typesetter: &'a dyn Typesetter) -> Self {
        Self {
            config,
            typesetter,
            stats: WidthStats::default(),
            groups: Vec::new(),
        }
    }

    /// Build every layer. A missing name always aborts; an unusable icon
    /// aborts unless `failOnBrokenUrl` is off, in which case only the
    /// offending row is dropped.
    pub fn build(mut self, layers: &[LegendEntry]) -> Result<(Vec<ItemGroup>, WidthStats), LegendError> {
        for (i, layer) in layers.iter().enumerate() {
            self.add_layer(i, layer)?;
        }
        Ok((self.groups, self.stats))
    }

    fn add_layer(&mut self, index: usize, layer: &LegendEntry) -> Result<(), LegendError> {
        let config = self.config;
        let layer_style = RowStyle {
            depth: Depth::Layer,
            indent: 0.0,
            font: config.layer_font(),
            space_before: if index == 0 { 0.0 } else { config.layer_space_before },
            space_after: config.layer_space,
            default_icon_before: config.icon_before_name,
        };
        let class_style = RowStyle {
            depth: Depth::Class,
            indent: config.class_indentation,
            font: config.class_font(),
            space_before: 0.0,
            space_after: config.class_space,
            default_icon_before: config.inline,
        };

        let mut rows = Vec::with_capacity(layer.classes.len() + 1);
        if let Some(item) = self.build_row(layer, &layer_style, || format!("layer {}", index))? {
            rows.push(item);
        }
        for (j, class) in layer.classes.iter().enumerate() {
            let context = || format!("class {} of layer {}", j, index);
            if let Some(item) = self.build_row(class, &class_style, context)? {
                rows.push(item);
            }
        }

        if config.dont_break_items {
            if !rows.is_empty() {
                self.push_group(rows);
            }
        } else {
            for row in rows {
                self.push_group(vec![row]);
            }
        }
        Ok(())
    }

    fn push_group(&mut self, rows: Vec<Item>) {
        let index = self.groups.len();
        self.groups.push(ItemGroup {
            index,
            rows,
            trimmed: false,
        });
    }

    /// Build one row, or `None` if it was skipped under the lenient icon policy.
    fn build_row(
        &mut self,
        entry: &LegendEntry,
        style: &RowStyle,
        context: impl FnOnce() -> String,
    ) -> Result<Option<Item>, LegendError> {
        let name = entry.require_name(context)?;
        let icon = match self.icon_content(entry) {
            Ok(icon) => icon,
            Err(e) if e.is_icon_failure() && !self.config.fail_on_broken_url => {
                log::warn!("Skipping legend item '{}': {}", name, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let config = self.config;
        let icon_before = entry.icon_before_name.unwrap_or(style.default_icon_before);
        let ip = config.icon_padding;
        let tp = config.text_padding;

        // Swatch cells are bare; their row's spacing lives in the label cell.
        let bare = Edges::default();
        let icon_padding = match icon {
            IconContent::Swatch { .. } | IconContent::None => bare,
            _ => Edges {
                top: style.space_before + ip.top,
                right: ip.right,
                bottom: style.space_after + ip.bottom,
                left: if icon_before { style.indent } else { 0.0 } + ip.left,
            },
        };
        let icon_leads = matches!(icon, IconContent::Image { .. } | IconContent::Strip { .. });
        let text_padding = Edges {
            top: style.space_before + tp.top,
            right: tp.right,
            bottom: style.space_after + tp.bottom,
            left: if !icon_leads || !icon_before { style.indent } else { 0.0 } + tp.left,
        };

        let item = Item {
            depth: style.depth,
            label: name.to_string(),
            font: style.font.clone(),
            line_height: config.line_height,
            icon_width: icon.natural_width(if icon_leads { &ip } else { &bare }),
            label_width: self.typesetter.measure_text(name, &style.font) + tp.horizontal(),
            icon,
            icon_before_label: icon_before,
            align_label_right: !icon_before && config.inline,
            space_before: style.space_before,
            space_after: style.space_after,
            icon_padding,
            text_padding,
        };
        self.stats.record(&item);
        Ok(Some(item))
    }

    fn icon_content(&self, entry: &LegendEntry) -> Result<IconContent, LegendError> {
        let target = IconBox {
            max_width: self.config.icon_max_width(),
            max_height: self.config.icon_max_height(),
        };
        let scale = entry
            .scale
            .filter(|s| *s > 0.0)
            .unwrap_or_else(|| self.config.scale());

        if !entry.icons.is_empty() {
            let icons = entry
                .icons
                .iter()
                .map(|src| self.typesetter.decode_image(src, target, scale))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(IconContent::Strip { icons });
        }
        if let Some(src) = entry.icon_ref() {
            let icon = self.typesetter.decode_image(src, target, scale)?;
            return Ok(IconContent::Image { icon });
        }
        if let Some(color) = entry.color.as_deref() {
            let icon = self.typesetter.swatch(color, target)?;
            return Ok(IconContent::Swatch { icon });
        }
        Ok(IconContent::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Engine;

    fn engine_with_icon(name: &str, w: u32, h: u32) -> Engine {
        let img = image::RgbaImage::new(w, h);
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgba8)
            .unwrap();
        let mut engine = Engine::new();
        engine.register_icon(name, buf);
        engine
    }

    fn build(config: &LegendConfig, engine: &Engine, layers: &[LegendEntry]) -> (Vec<ItemGroup>, WidthStats) {
        ItemBuilder::new(config, engine).build(layers).unwrap()
    }

    #[test]
    fn one_group_per_row_by_default() {
        let engine = Engine::new();
        let layers = vec![
            LegendEntry::named("Roads").with_classes(vec![
                LegendEntry::named("Highway"),
                LegendEntry::named("Street"),
            ]),
            LegendEntry::named("Rivers"),
        ];
        let (groups, _) = build(&LegendConfig::default(), &engine, &layers);
        let labels: Vec<&str> = groups.iter().map(|g| g.rows[0].label.as_str()).collect();
        assert_eq!(labels, ["Roads", "Highway", "Street", "Rivers"]);
        assert!(groups.iter().enumerate().all(|(i, g)| g.index == i));
        assert_eq!(groups[1].rows[0].depth, Depth::Class);
    }

    #[test]
    fn dont_break_items_keeps_layer_with_classes() {
        let engine = Engine::new();
        let config = LegendConfig {
            dont_break_items: true,
            ..Default::default()
        };
        let layers = vec![
            LegendEntry::named("Roads").with_classes(vec![LegendEntry::named("Highway")]),
            LegendEntry::named("Rivers"),
        ];
        let (groups, _) = build(&config, &engine, &layers);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows.len(), 2);
    }

    #[test]
    fn spacing_and_indentation_go_into_padding() {
        let engine = engine_with_icon("i", 8, 8);
        let config = LegendConfig {
            icon_padding: Edges::uniform(1.0),
            text_padding: Edges::uniform(2.0),
            ..Default::default()
        };
        let layers = vec![
            LegendEntry::named("First"),
            LegendEntry::named("Second")
                .with_icon("i")
                .with_classes(vec![LegendEntry::named("Class").with_icon("i")]),
        ];
        let (groups, stats) = build(&config, &engine, &layers);

        let first = &groups[0].rows[0];
        assert_eq!(first.space_before, 0.0);
        assert!(first.is_merged());

        let second = &groups[1].rows[0];
        assert_eq!(second.icon_padding.top, 5.0 + 1.0);
        assert_eq!(second.icon_padding.bottom, 5.0 + 1.0);
        assert_eq!(second.text_padding.left, 2.0);
        assert_eq!(second.icon_width, 8.0 + 2.0);

        let class = &groups[2].rows[0];
        assert_eq!(class.icon_padding.left, 20.0 + 1.0);
        assert_eq!(class.icon_padding.bottom, 2.0 + 1.0);
        assert_eq!(class.text_padding.left, 2.0);

        assert_eq!(stats.max_icon_width, 10.0);
        assert!(stats.max_label_width > 0.0);
    }

    #[test]
    fn label_first_rows_take_the_indent_and_align_right() {
        let engine = engine_with_icon("i", 8, 8);
        let layers = vec![LegendEntry::named("Roads").with_classes(vec![LegendEntry {
            icon_before_name: Some(false),
            ..LegendEntry::named("Highway").with_icon("i")
        }])];
        let (groups, _) = build(&LegendConfig::default(), &engine, &layers);
        let class = &groups[1].rows[0];
        assert_eq!(class.text_padding.left, 20.0);
        assert_eq!(class.icon_padding.left, 0.0);
        assert!(class.align_label_right);
        let widths = CellWidths { icon: 10.0, text: 50.0 };
        assert_eq!(
            class.cells(widths),
            vec![(CellKind::Label, 50.0), (CellKind::Icon, 10.0)]
        );
    }

    #[test]
    fn icon_strip_sums_padded_widths() {
        let engine = engine_with_icon("i", 6, 4);
        let config = LegendConfig {
            icon_padding: Edges::symmetric(0.0, 1.0),
            ..Default::default()
        };
        let layers = vec![LegendEntry {
            icons: vec!["i".into(), "i".into(), "i".into()],
            ..LegendEntry::named("Strip")
        }];
        let (groups, _) = build(&config, &engine, &layers);
        assert_eq!(groups[0].rows[0].icon_width, 3.0 * (6.0 + 2.0));
        assert_eq!(groups[0].rows[0].icon.height(), 4.0);
    }

    #[test]
    fn per_entry_scale_overrides_default() {
        let engine = engine_with_icon("i", 4, 4);
        let config = LegendConfig {
            icon_max_height: 0.0,
            ..Default::default()
        };
        let layers = vec![LegendEntry {
            scale: Some(2.0),
            ..LegendEntry::named("Big").with_icon("i")
        }];
        let (groups, _) = build(&config, &engine, &layers);
        assert_eq!(groups[0].rows[0].icon.height(), 8.0);
    }

    #[test]
    fn missing_name_is_fatal_even_when_lenient() {
        let engine = Engine::new();
        let config = LegendConfig {
            fail_on_broken_url: false,
            ..Default::default()
        };
        let layers = vec![LegendEntry::named("Roads").with_classes(vec![LegendEntry::default()])];
        let err = ItemBuilder::new(&config, &engine).build(&layers).unwrap_err();
        assert!(matches!(err, LegendError::MissingField { field: "name", .. }));
    }

    #[test]
    fn broken_icon_fails_by_default() {
        let engine = Engine::new();
        let layers = vec![LegendEntry::named("Roads").with_icon("/missing/roads.png")];
        let err = ItemBuilder::new(&LegendConfig::default(), &engine)
            .build(&layers)
            .unwrap_err();
        assert!(err.is_icon_failure());
    }

    #[test]
    fn broken_icon_drops_only_its_row_when_lenient() {
        let engine = Engine::new();
        let config = LegendConfig {
            fail_on_broken_url: false,
            ..Default::default()
        };
        let layers = vec![LegendEntry::named("Roads").with_classes(vec![
            LegendEntry::named("Broken").with_icon("/missing/roads.png"),
            LegendEntry::named("Bad color").with_color("#nothex"),
            LegendEntry::named("Fine"),
        ])];
        let (groups, _) = build(&config, &engine, &layers);
        let labels: Vec<&str> = groups.iter().map(|g| g.rows[0].label.as_str()).collect();
        assert_eq!(labels, ["Roads", "Fine"]);
    }

    #[test]
    fn trimming_removes_leading_space_once() {
        let engine = Engine::new();
        let layers = vec![LegendEntry::named("A"), LegendEntry::named("B")];
        let (groups, _) = build(&LegendConfig::default(), &engine, &layers);
        assert!(groups[0].trimmed_for_column_top().is_none());
        let trimmed = groups[1].trimmed_for_column_top().unwrap();
        assert!(trimmed.trimmed);
        assert_eq!(trimmed.space_before(), 0.0);
        assert_eq!(trimmed.rows[0].text_padding.top, 0.0);
        assert!(trimmed.trimmed_for_column_top().is_none());
    }
}
