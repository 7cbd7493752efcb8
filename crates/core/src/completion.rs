use crate::model::SqlContext;

//
// ─── SUGGESTIONS ───────────────────────────────────────────────────────────────
//

/// Characters that should prompt the editor to ask for fresh suggestions.
pub const TRIGGER_CHARACTERS: [char; 3] = [' ', '.', '\n'];

/// Keywords that introduce a table name in a SQL statement.
const TABLE_KEYWORDS: [&str; 4] = ["FROM", "JOIN", "UPDATE", "INTO"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Table,
    Column,
}

/// One completion entry offered to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    label: String,
    kind: SuggestionKind,
}

impl Suggestion {
    fn table(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: SuggestionKind::Table,
        }
    }

    fn column(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: SuggestionKind::Column,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn kind(&self) -> SuggestionKind {
        self.kind
    }
}

//
// ─── RESOLUTION ────────────────────────────────────────────────────────────────
//

/// Resolves completion suggestions for the text to the left of the cursor.
///
/// Rules are tried in order and the first that applies wins:
///
/// 1. Text ends with a table keyword (`FROM`, `JOIN`, `UPDATE`, `INTO`)
///    followed by whitespace: every table name in the context.
/// 2. Text ends with `identifier.`: the columns of that table, or nothing
///    when the context has no table by that name.
/// 3. Anything else: every column of every table in the context.
///
/// # Examples
///
/// ```
/// # use tutor_core::completion::{resolve, SuggestionKind};
/// # use tutor_core::model::{SqlContext, TableName, TableSchema};
/// let users = TableName::new("users").unwrap();
/// let context = SqlContext::new(vec![TableSchema::new(
///     users,
///     vec!["id".into(), "name".into()],
/// )]);
/// let suggestions = resolve(&context, "SELECT * FROM ");
/// assert_eq!(suggestions.len(), 1);
/// assert_eq!(suggestions[0].label(), "users");
/// assert_eq!(suggestions[0].kind(), SuggestionKind::Table);
/// ```
#[must_use]
pub fn resolve(context: &SqlContext, line_before_cursor: &str) -> Vec<Suggestion> {
    if ends_with_table_keyword(line_before_cursor) {
        return context
            .tables()
            .iter()
            .map(|table| Suggestion::table(table.name().as_str()))
            .collect();
    }

    if let Some(name) = trailing_table_identifier(line_before_cursor) {
        return match context.table(name) {
            Some(table) => table.columns().iter().map(Suggestion::column).collect(),
            None => Vec::new(),
        };
    }

    context.all_columns().map(Suggestion::column).collect()
}

/// Resolves suggestions for a cursor position inside `line`.
///
/// `cursor` counts characters from the start of the line; anything at or
/// beyond the cursor is ignored.
#[must_use]
pub fn resolve_at(context: &SqlContext, line: &str, cursor: usize) -> Vec<Suggestion> {
    let prefix: String = line.chars().take(cursor).collect();
    resolve(context, &prefix)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when the text ends with one of `TABLE_KEYWORDS` as a whole word,
/// followed by at least one whitespace character.
fn ends_with_table_keyword(text: &str) -> bool {
    if !text.ends_with(char::is_whitespace) {
        return false;
    }
    let trimmed = text.trim_end();
    TABLE_KEYWORDS.iter().any(|keyword| {
        let Some(start) = trimmed.len().checked_sub(keyword.len()) else {
            return false;
        };
        let Some(tail) = trimmed.get(start..) else {
            return false;
        };
        if !tail.eq_ignore_ascii_case(keyword) {
            return false;
        }
        match trimmed[..start].chars().next_back() {
            Some(prev) => !is_ident_char(prev),
            None => true,
        }
    })
}

/// Extracts the identifier immediately before a trailing dot.
///
/// The run may not start with digits; leading digits are dropped so that
/// `1users.` still resolves the table `users`. Returns `None` when nothing
/// identifier-like precedes the dot.
fn trailing_table_identifier(text: &str) -> Option<&str> {
    let before_dot = text.strip_suffix('.')?;
    let run_start = before_dot
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(index, _)| index)?;
    let name = before_dot[run_start..].trim_start_matches(|c: char| c.is_ascii_digit());
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableName, TableSchema};

    fn build_table(name: &str, columns: &[&str]) -> TableSchema {
        TableSchema::new(
            TableName::new(name).unwrap(),
            columns.iter().map(|c| (*c).to_string()).collect(),
        )
    }

    fn build_context() -> SqlContext {
        SqlContext::new(vec![
            build_table("users", &["id", "name"]),
            build_table("orders", &["id", "total"]),
        ])
    }

    fn labels(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(Suggestion::label).collect()
    }

    #[test]
    fn keyword_then_space_suggests_tables_in_context_order() {
        let context = build_context();
        for text in ["SELECT * FROM ", "from ", "a JOIN  ", "UPDATE\n", "INSERT INTO "] {
            let suggestions = resolve(&context, text);
            assert_eq!(labels(&suggestions), vec!["users", "orders"], "{text:?}");
            assert!(suggestions.iter().all(|s| s.kind() == SuggestionKind::Table));
        }
    }

    #[test]
    fn keyword_needs_trailing_whitespace() {
        let context = build_context();
        let suggestions = resolve(&context, "SELECT * FROM");
        assert_eq!(labels(&suggestions), vec!["id", "name", "id", "total"]);
    }

    #[test]
    fn keyword_needs_a_word_boundary() {
        let context = build_context();
        let suggestions = resolve(&context, "SELECT therefrom ");
        assert!(suggestions.iter().all(|s| s.kind() == SuggestionKind::Column));
        let suggestions = resolve(&context, "SELECT x2from ");
        assert!(suggestions.iter().all(|s| s.kind() == SuggestionKind::Column));
    }

    #[test]
    fn dot_after_known_table_suggests_its_columns() {
        let context = build_context();
        let suggestions = resolve(&context, "SELECT orders.");
        assert_eq!(labels(&suggestions), vec!["id", "total"]);
        assert!(suggestions.iter().all(|s| s.kind() == SuggestionKind::Column));
    }

    #[test]
    fn dot_after_unknown_table_suggests_nothing() {
        let context = build_context();
        assert!(resolve(&context, "SELECT missing.").is_empty());
    }

    #[test]
    fn leading_digits_are_dropped_from_the_identifier() {
        let context = build_context();
        let suggestions = resolve(&context, "SELECT 1users.");
        assert_eq!(labels(&suggestions), vec!["id", "name"]);
    }

    #[test]
    fn all_digit_run_falls_back_to_every_column() {
        let context = build_context();
        let suggestions = resolve(&context, "SELECT 123.");
        assert_eq!(labels(&suggestions), vec!["id", "name", "id", "total"]);
    }

    #[test]
    fn bare_dot_falls_back_to_every_column() {
        let context = build_context();
        let suggestions = resolve(&context, "SELECT .");
        assert_eq!(labels(&suggestions), vec!["id", "name", "id", "total"]);
    }

    #[test]
    fn fallback_lists_every_column_with_duplicates() {
        let context = build_context();
        let suggestions = resolve(&context, "SELECT id");
        assert_eq!(labels(&suggestions), vec!["id", "name", "id", "total"]);
    }

    #[test]
    fn empty_context_yields_no_suggestions() {
        let context = SqlContext::default();
        assert!(resolve(&context, "SELECT * FROM ").is_empty());
        assert!(resolve(&context, "SELECT x").is_empty());
    }

    #[test]
    fn resolve_at_ignores_text_after_the_cursor() {
        let context = build_context();
        let line = "SELECT * FROM users WHERE";
        let suggestions = resolve_at(&context, line, "SELECT * FROM ".chars().count());
        assert_eq!(labels(&suggestions), vec!["users", "orders"]);
    }

    #[test]
    fn table_lookup_is_case_sensitive() {
        let context = build_context();
        assert!(resolve(&context, "SELECT Users.").is_empty());
    }

    #[test]
    fn trigger_characters_map_onto_the_rules() {
        let context = build_context();
        let [space, dot, newline] = TRIGGER_CHARACTERS;

        // Both whitespace triggers close a table keyword.
        for trigger in [space, newline] {
            let line = format!("SELECT * FROM{trigger}");
            assert_eq!(labels(&resolve(&context, &line)), vec!["users", "orders"]);
        }

        let line = format!("SELECT users{dot}");
        assert_eq!(labels(&resolve(&context, &line)), vec!["id", "name"]);
    }
}
