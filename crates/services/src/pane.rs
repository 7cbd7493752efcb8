//! The panes that render tabular output: live preview results and the
//! lesson's read-only source tables.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tutor_core::model::{PreviewTable, TableName};

/// Rendering surface for preview results, below the editor.
pub trait PreviewPane: Send + Sync {
    /// Render a result table, replacing whatever was shown before.
    fn show_results(&self, table: PreviewTable);

    /// Show or hide the whole pane.
    fn set_visible(&self, visible: bool);
}

/// One lesson table shown read-only beside the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub name: TableName,
    pub contents: PreviewTable,
}

/// Rendering surface for the lesson's source tables, filled once per
/// session at the opening render.
pub trait SourcePane: Send + Sync {
    /// Render the lesson tables, replacing whatever was shown before.
    fn show_tables(&self, tables: Vec<SourceTable>);
}

/// Recording pane used by tests and the terminal front-end. Starts visible,
/// matching the page default.
#[derive(Debug)]
pub struct BufferPane {
    state: Mutex<PaneState>,
}

#[derive(Debug)]
struct PaneState {
    table: Option<PreviewTable>,
    visible: bool,
    renders: u64,
}

impl BufferPane {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PaneState {
                table: None,
                visible: true,
                renders: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PaneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The most recently rendered table.
    #[must_use]
    pub fn latest(&self) -> Option<PreviewTable> {
        self.state().table.clone()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    /// How many tables have been rendered in total.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.state().renders
    }
}

impl Default for BufferPane {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewPane for BufferPane {
    fn show_results(&self, table: PreviewTable) {
        let mut state = self.state();
        state.table = Some(table);
        state.renders += 1;
    }

    fn set_visible(&self, visible: bool) {
        self.state().visible = visible;
    }
}

/// Recording source pane used by tests and the terminal front-end.
#[derive(Debug, Default)]
pub struct BufferSourcePane {
    tables: Mutex<Vec<SourceTable>>,
}

impl BufferSourcePane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently rendered set of lesson tables.
    #[must_use]
    pub fn latest(&self) -> Vec<SourceTable> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SourcePane for BufferSourcePane {
    fn show_tables(&self, tables: Vec<SourceTable>) {
        *self.tables.lock().unwrap_or_else(PoisonError::into_inner) = tables;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_replace_and_count() {
        let pane = BufferPane::new();
        assert!(pane.is_visible());
        assert_eq!(pane.render_count(), 0);

        pane.show_results(PreviewTable::new(vec!["id".into()], vec![vec!["1".into()]]));
        pane.show_results(PreviewTable::new(vec!["id".into()], vec![vec!["2".into()]]));

        assert_eq!(pane.render_count(), 2);
        let latest = pane.latest().unwrap();
        assert_eq!(latest.rows()[0][0], "2");
    }

    #[test]
    fn visibility_toggles() {
        let pane = BufferPane::new();
        pane.set_visible(false);
        assert!(!pane.is_visible());
        pane.set_visible(true);
        assert!(pane.is_visible());
    }

    #[test]
    fn source_tables_replace_the_previous_set() {
        let pane = BufferSourcePane::new();
        assert!(pane.latest().is_empty());

        let users = SourceTable {
            name: TableName::new("users").unwrap(),
            contents: PreviewTable::new(vec!["id".into()], vec![vec!["1".into()]]),
        };
        pane.show_tables(vec![users.clone()]);
        assert_eq!(pane.latest(), vec![users]);

        pane.show_tables(Vec::new());
        assert!(pane.latest().is_empty());
    }
}
