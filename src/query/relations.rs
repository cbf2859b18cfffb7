//! Relation resolution
//!
//! Turns requested relation paths into joins. `"room"` joins the base
//! entity's `room` relation; `"course.room"` joins `room` off the
//! already-joined `course` alias and names it `room`.

use super::builder::SelectQuery;

/// Add one join per relation path, in the given order.
///
/// Paths are not deduplicated and not checked against metadata; the store
/// rejects anything it cannot join.
pub fn resolve_relations<S: AsRef<str>>(query: &mut SelectQuery, relations: &[S]) {
    for path in relations {
        let path = path.as_ref();
        match path.split_once('.') {
            Some((parent, sub)) => {
                query.left_join_and_select(parent, sub, sub);
            }
            None => {
                let base = query.alias().to_string();
                query.left_join_and_select(base, path, path);
            }
        }
    }
}

/// Split a comma separated relation list, dropping blanks
pub fn parse_relation_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
