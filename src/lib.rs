//! # Legend Layout
//!
//! Paginated, multi-column layout for map legends.
//!
//! A legend is a list of layers, each with a list of classes; every entry
//! has a label and optionally an icon, a strip of icons or a color swatch.
//! The sizes that matter are only known once text is measured and wrapped
//! and icons are decoded, so layout is driven by a typesetting backend.
//! The rows are packed into columns under a height limit, and columns that
//! do not fit on the page are carried over to continuation pages.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model/config]  Legend records, options, page geometry
//!       ↓
//!   [measure]       Typesetter seam: text widths, icon sizes, heights
//!       ↓
//!   [layout]        Rows → shared cell widths → columns → grid
//!       ↓
//!   [page]          Continuation pages for columns that did not fit
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod icon;
pub mod layout;
pub mod measure;
pub mod model;
pub mod page;
pub mod text;

use serde::Deserialize;

pub use config::LegendConfig;
pub use error::LegendError;
pub use layout::{Artifact, LegendBlock};
pub use measure::{Engine, Typesetter};
pub use model::{LegendEntry, PageGeometry};
pub use page::{PagePosition, PageRun, RenderedPage};

/// Everything needed to render one legend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendRequest {
    #[serde(default)]
    pub config: LegendConfig,
    #[serde(default)]
    pub page: PageGeometry,
    #[serde(default)]
    pub position: PagePosition,
    #[serde(default)]
    pub legends: Vec<LegendEntry>,
}

/// Render a legend onto as many pages as it needs.
pub fn render(request: &LegendRequest, typesetter: &dyn Typesetter) -> Result<Vec<RenderedPage>, LegendError> {
    let mut block = LegendBlock::new(request.config.clone())?;
    PageRun::new(request.page, request.position).run(&mut block, &request.legends, typesetter)
}

/// Render a legend described as JSON with the built-in engine.
pub fn render_json(json: &str) -> Result<Vec<RenderedPage>, LegendError> {
    let request: LegendRequest = serde_json::from_str(json)?;
    render(&request, &Engine::new())
}
