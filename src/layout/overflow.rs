//! Columns waiting for a continuation page.

use std::collections::VecDeque;

use super::columns::Column;

/// Columns that did not fit on the page they were laid out for. Owned by
/// the legend block and drained oldest-first, one page budget at a time.
#[derive(Debug, Default)]
pub struct OverflowQueue {
    pending: VecDeque<Column>,
}

impl OverflowQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Queue columns behind anything already pending.
    pub fn defer(&mut self, columns: impl IntoIterator<Item = Column>) {
        self.pending.extend(columns);
    }

    /// Take up to `budget` columns. The flag reports whether more remain.
    pub fn next_pending_batch(&mut self, budget: usize) -> (Vec<Column>, bool) {
        let take = budget.min(self.pending.len());
        let batch: Vec<Column> = self.pending.drain(..take).collect();
        (batch, !self.pending.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::widths::CellWidths;

    fn column(height: f64) -> Column {
        Column {
            widths: CellWidths { icon: 0.0, text: 10.0 },
            entries: Vec::new(),
            height,
        }
    }

    #[test]
    fn drains_oldest_first_within_budget() {
        let mut queue = OverflowQueue::new();
        queue.defer((1..=5).map(|h| column(h as f64)));

        let (batch, more) = queue.next_pending_batch(2);
        assert_eq!(batch.iter().map(|c| c.height).collect::<Vec<_>>(), [1.0, 2.0]);
        assert!(more);

        let (batch, more) = queue.next_pending_batch(2);
        assert_eq!(batch.iter().map(|c| c.height).collect::<Vec<_>>(), [3.0, 4.0]);
        assert!(more);

        let (batch, more) = queue.next_pending_batch(2);
        assert_eq!(batch.len(), 1);
        assert!(!more);
        assert!(queue.is_empty());
    }

    #[test]
    fn unbounded_budget_takes_everything() {
        let mut queue = OverflowQueue::new();
        queue.defer(vec![column(1.0), column(2.0)]);
        let (batch, more) = queue.next_pending_batch(usize::MAX);
        assert_eq!(batch.len(), 2);
        assert!(!more);
    }

    #[test]
    fn empty_queue_yields_nothing() {
        let mut queue = OverflowQueue::new();
        let (batch, more) = queue.next_pending_batch(3);
        assert!(batch.is_empty());
        assert!(!more);
        assert_eq!(queue.len(), 0);
    }
}
