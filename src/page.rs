//! # Page Sequencing
//!
//! The legend block does not own pages. It asks a [`PageSequencer`] for the
//! current page and, when columns are left over, for one continuation page
//! right after it. [`PageRun`] is a small in-memory sequencer that keeps
//! rendering a block on continuation pages until nothing is pending.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::LegendError;
use crate::layout::{Artifact, LegendBlock};
use crate::measure::Typesetter;
use crate::model::{LegendEntry, PageGeometry};

/// Where in the report the current page sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PagePosition {
    TitlePage,
    #[default]
    MainPage,
    LastPage,
    ExtraPage,
}

/// Where a continuation page is inserted into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderOn {
    BeforeMainPage,
    BeforeLastPage,
    AfterLastPage,
}

impl From<PagePosition> for RenderOn {
    fn from(position: PagePosition) -> Self {
        match position {
            PagePosition::TitlePage => RenderOn::BeforeMainPage,
            PagePosition::MainPage => RenderOn::BeforeLastPage,
            PagePosition::LastPage | PagePosition::ExtraPage => RenderOn::AfterLastPage,
        }
    }
}

/// A request for one more page carrying the same legend block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationRequest {
    /// Index of the page the continuation follows.
    pub after_page: usize,
    pub render_on: RenderOn,
    /// The continuation copies the current page's format.
    pub page: PageGeometry,
}

impl ContinuationRequest {
    pub fn after(pages: &dyn PageSequencer) -> Self {
        Self {
            after_page: pages.current_index(),
            render_on: pages.current_position().into(),
            page: pages.current_page(),
        }
    }
}

/// The surrounding page pipeline, as seen by a legend block.
pub trait PageSequencer {
    fn current_page(&self) -> PageGeometry;
    fn current_position(&self) -> PagePosition;
    fn current_index(&self) -> usize;
    fn schedule_continuation(&mut self, request: ContinuationRequest);
}

/// One rendered page of a [`PageRun`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub index: usize,
    pub position: PagePosition,
    /// Set on continuation pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_on: Option<RenderOn>,
    pub page: PageGeometry,
    pub artifact: Artifact,
}

/// Renders one legend block on a first page and then on every
/// continuation page it asks for.
pub struct PageRun {
    index: usize,
    position: PagePosition,
    page: PageGeometry,
    scheduled: VecDeque<ContinuationRequest>,
    history: Vec<ContinuationRequest>,
}

impl PageRun {
    pub fn new(page: PageGeometry, position: PagePosition) -> Self {
        Self {
            index: 0,
            position,
            page,
            scheduled: VecDeque::new(),
            history: Vec::new(),
        }
    }

    /// Every continuation requested so far.
    pub fn requests(&self) -> &[ContinuationRequest] {
        &self.history
    }

    pub fn run(
        &mut self,
        block: &mut LegendBlock,
        layers: &[LegendEntry],
        typesetter: &dyn Typesetter,
    ) -> Result<Vec<RenderedPage>, LegendError> {
        let mut pages = Vec::new();
        let mut render_on = None;
        loop {
            let artifact = block.render(layers, typesetter, self)?;
            pages.push(RenderedPage {
                index: self.index,
                position: self.position,
                render_on,
                page: self.page,
                artifact,
            });
            let Some(next) = self.scheduled.pop_front() else {
                break;
            };
            self.index = next.after_page + 1;
            self.position = PagePosition::ExtraPage;
            self.page = next.page;
            render_on = Some(next.render_on);
        }
        Ok(pages)
    }
}

impl PageSequencer for PageRun {
    fn current_page(&self) -> PageGeometry {
        self.page
    }

    fn current_position(&self) -> PagePosition {
        self.position
    }

    fn current_index(&self) -> usize {
        self.index
    }

    fn schedule_continuation(&mut self, request: ContinuationRequest) {
        self.scheduled.push_back(request);
        self.history.push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_on_follows_page_position() {
        assert_eq!(RenderOn::from(PagePosition::TitlePage), RenderOn::BeforeMainPage);
        assert_eq!(RenderOn::from(PagePosition::MainPage), RenderOn::BeforeLastPage);
        assert_eq!(RenderOn::from(PagePosition::LastPage), RenderOn::AfterLastPage);
        assert_eq!(RenderOn::from(PagePosition::ExtraPage), RenderOn::AfterLastPage);
    }

    #[test]
    fn continuation_copies_current_page() {
        let mut run = PageRun::new(PageGeometry::default(), PagePosition::TitlePage);
        let request = ContinuationRequest::after(&run);
        assert_eq!(request.after_page, 0);
        assert_eq!(request.render_on, RenderOn::BeforeMainPage);
        assert_eq!(request.page, PageGeometry::default());
        run.schedule_continuation(request);
        assert_eq!(run.requests().len(), 1);
    }

    #[test]
    fn position_parses_from_camel_case() {
        let p: PagePosition = serde_json::from_str("\"lastPage\"").unwrap();
        assert_eq!(p, PagePosition::LastPage);
    }
}
