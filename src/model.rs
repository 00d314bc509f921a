//! # Legend Model
//!
//! Input records and the small geometry vocabulary shared by every stage.
//! A legend is a list of layers; each layer carries its own name and icon
//! plus a list of classes, which use the same record shape one level down.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LegendError;

/// One layer (or, nested under `classes`, one class) of the legend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    /// Label text. Required; a missing name aborts the legend.
    #[serde(default)]
    pub name: Option<String>,

    /// A single icon reference (file path, `file://` URI or data URI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Several icons rendered side by side as one strip.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,

    /// Solid swatch color, used when no icon is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Per-entry override of the icon/label order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_before_name: Option<bool>,

    /// Per-entry override of the icon scale factor.
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub scale: Option<f64>,

    /// Class entries of a layer. Ignored below the first level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<LegendEntry>,
}

impl LegendEntry {
    /// Create an entry with only a name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, src: &str) -> Self {
        self.icon = Some(src.to_string());
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn with_classes(mut self, classes: Vec<LegendEntry>) -> Self {
        self.classes = classes;
        self
    }

    /// The icon reference, treating an empty string as absent.
    pub fn icon_ref(&self) -> Option<&str> {
        self.icon.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn require_name(&self, context: impl FnOnce() -> String) -> Result<&str, LegendError> {
        self.name.as_deref().ok_or_else(|| LegendError::MissingField {
            field: "name",
            context: context(),
        })
    }
}

/// Scale factors arrive as numbers or numeric strings.
fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(f64),
        Text(String),
    }

    match Option::<Lenient>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lenient::Number(v)) => Ok(Some(v)),
        Some(Lenient::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid scale '{}'", s))),
    }
}

/// Edge values (top, right, bottom, left) used for padding and margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    /// Parse CSS shorthand: one to four space separated values.
    pub fn parse_css(values: &str) -> Option<Self> {
        let parts: Vec<f64> = values
            .split_whitespace()
            .map(|p| p.parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        Self::from_list(&parts)
    }

    fn from_list(parts: &[f64]) -> Option<Self> {
        match parts {
            [all] => Some(Self::uniform(*all)),
            [v, h] => Some(Self::symmetric(*v, *h)),
            [t, h, b] => Some(Self {
                top: *t,
                right: *h,
                bottom: *b,
                left: *h,
            }),
            [t, r, b, l, ..] => Some(Self {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            }),
            [] => None,
        }
    }

    pub(crate) fn any_negative(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .any(|v| *v < 0.0 || !v.is_finite())
    }
}

impl<'de> Deserialize<'de> for Edges {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum EdgesInput {
            Uniform(f64),
            Css(String),
            List(Vec<f64>),
            Explicit {
                #[serde(default)]
                top: f64,
                #[serde(default)]
                right: f64,
                #[serde(default)]
                bottom: f64,
                #[serde(default)]
                left: f64,
            },
        }

        match EdgesInput::deserialize(deserializer)? {
            EdgesInput::Uniform(v) => Ok(Edges::uniform(v)),
            EdgesInput::Css(s) => Edges::parse_css(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid padding '{}'", s))),
            EdgesInput::List(v) => Edges::from_list(&v)
                .ok_or_else(|| serde::de::Error::custom("padding list must not be empty")),
            EdgesInput::Explicit {
                top,
                right,
                bottom,
                left,
            } => Ok(Edges {
                top,
                right,
                bottom,
                left,
            }),
        }
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Geometry of the page a legend is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

fn default_margin() -> Edges {
    Edges::uniform(36.0)
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f64 {
        (self.size.dimensions().0 - self.margin.horizontal()).max(0.0)
    }

    pub fn content_height(&self) -> f64 {
        (self.size.dimensions().1 - self.margin.vertical()).max(0.0)
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    fn from_u24(v: u32) -> Self {
        Self::rgb(
            ((v >> 16) & 0xFF) as f64 / 255.0,
            ((v >> 8) & 0xFF) as f64 / 255.0,
            (v & 0xFF) as f64 / 255.0,
        )
    }

    /// Parse a swatch color: `#rgb`, `#rrggbb`, `0xRRGGBB`, a decimal
    /// integer, `rgb(r, g, b)` or a basic color name.
    pub fn parse(s: &str) -> Result<Self, LegendError> {
        let s = s.trim();
        let invalid = || LegendError::InvalidColor(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            return match hex.len() {
                3 => {
                    let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                    u32::from_str_radix(&expanded, 16)
                        .map(Self::from_u24)
                        .map_err(|_| invalid())
                }
                6 => u32::from_str_radix(hex, 16)
                    .map(Self::from_u24)
                    .map_err(|_| invalid()),
                _ => Err(invalid()),
            };
        }
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .filter(|v| *v <= 0xFF_FFFF)
                .map(Self::from_u24)
                .ok_or_else(invalid);
        }
        if let Some(inner) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<f64> = inner
                .split(',')
                .map(|p| p.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| invalid())?;
            return match parts.as_slice() {
                [r, g, b] => Ok(Self::rgb(
                    (r / 255.0).clamp(0.0, 1.0),
                    (g / 255.0).clamp(0.0, 1.0),
                    (b / 255.0).clamp(0.0, 1.0),
                )),
                _ => Err(invalid()),
            };
        }
        if let Ok(v) = s.parse::<u32>() {
            if v <= 0xFF_FFFF {
                return Ok(Self::from_u24(v));
            }
        }
        match s.to_lowercase().as_str() {
            "black" => Ok(Self::rgb(0.0, 0.0, 0.0)),
            "white" => Ok(Self::rgb(1.0, 1.0, 1.0)),
            "red" => Ok(Self::rgb(1.0, 0.0, 0.0)),
            "green" => Ok(Self::rgb(0.0, 0.502, 0.0)),
            "blue" => Ok(Self::rgb(0.0, 0.0, 1.0)),
            "yellow" => Ok(Self::rgb(1.0, 1.0, 0.0)),
            "gray" | "grey" => Ok(Self::rgb(0.502, 0.502, 0.502)),
            "orange" => Ok(Self::rgb(1.0, 0.647, 0.0)),
            "purple" => Ok(Self::rgb(0.502, 0.0, 0.502)),
            _ => Err(invalid()),
        }
    }
}

/// Horizontal alignment of the legend grid and its items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl<'de> Deserialize<'de> for HorizontalAlignment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        // Anything unrecognised keeps the default, matching lenient report configs.
        Ok(match raw.to_ascii_lowercase().as_str() {
            "left" => HorizontalAlignment::Left,
            "right" => HorizontalAlignment::Right,
            _ => HorizontalAlignment::Center,
        })
    }
}
