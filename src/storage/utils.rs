//! Helpers shared by the storage submodules.

use std::str::FromStr;

use crate::error_handling::DatabaseError;

/// Builds a multi-row `INSERT` with one `(?, ...)` group per row.
///
/// Returns an empty string for zero rows; callers skip execution then.
pub(crate) fn build_batch_insert_query(
    table_name: &str,
    columns: &[&str],
    row_count: usize,
    conflict_clause: Option<&str>,
) -> String {
    if row_count == 0 {
        return String::new();
    }

    let placeholder = format!(
        "({})",
        (0..columns.len()).map(|_| "?").collect::<Vec<_>>().join(", ")
    );
    let placeholders: Vec<String> = (0..row_count).map(|_| placeholder.clone()).collect();

    let mut query = format!(
        "INSERT INTO {} ({}) VALUES {}",
        table_name,
        columns.join(", "),
        placeholders.join(", ")
    );

    if let Some(conflict) = conflict_clause {
        query.push(' ');
        query.push_str(conflict);
    }

    query
}

/// Parses a stored enum label, reporting the column on failure.
pub(crate) fn parse_label<T: FromStr>(column: &'static str, value: String) -> Result<T, DatabaseError> {
    T::from_str(&value).map_err(|_| DatabaseError::CorruptValue { column, value })
}

/// Stored counts are non-negative; a negative value means the row was tampered with.
pub(crate) fn to_count(column: &'static str, value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value).map_err(|_| DatabaseError::CorruptValue {
        column,
        value: value.to_string(),
    })
}

/// Counts above `i64::MAX` are clamped rather than wrapped.
pub(crate) fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
