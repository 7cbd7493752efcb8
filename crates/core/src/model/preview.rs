/// A rendered preview result: ordered columns plus rows projected into that
/// column order.
///
/// Ephemeral: the pane renders whatever arrives and nothing is retained
/// between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PreviewTable {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Graded verdict returned by the evaluation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    matched: bool,
    explanation: String,
}

impl Evaluation {
    #[must_use]
    pub fn new(matched: bool, explanation: impl Into<String>) -> Self {
        Self {
            matched,
            explanation: explanation.into(),
        }
    }

    #[must_use]
    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Mismatch explanation, if the server supplied one. The wire carries an
    /// empty string when there is nothing to say.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        if self.explanation.is_empty() {
            None
        } else {
            Some(&self.explanation)
        }
    }
}
