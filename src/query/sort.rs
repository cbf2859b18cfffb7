//! Sort application

use super::builder::{SelectQuery, SortDirection};
use crate::metadata::EntityMetadata;

/// Parse a `column:direction` spec.
///
/// Direction is case-insensitive. Anything other than `desc`, including
/// a missing direction, sorts ascending.
pub fn parse_sort_spec(spec: &str) -> (&str, SortDirection) {
    let mut parts = spec.split(':');
    let column = parts.next().unwrap_or_default().trim();
    let direction = match parts.next() {
        Some(dir) if dir.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    (column, direction)
}

/// Order by the spec's column if the entity has it.
///
/// Returns false when the column is unknown and nothing was applied.
pub fn apply_sort(query: &mut SelectQuery, spec: &str, metadata: &EntityMetadata) -> bool {
    let (column, direction) = parse_sort_spec(spec);
    if !metadata.has_column(column) {
        return false;
    }
    let target = query.column(column);
    query.order_by(target, direction);
    true
}
