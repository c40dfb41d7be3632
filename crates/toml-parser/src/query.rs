//! Position lookups over a parsed manifest, shared by hover, completion and
//! code actions.

use crate::dependency::Dependency;
use crate::item::Item;
use crate::line_index::LineIndex;

/// The header table whose region contains `offset`.
pub fn enclosing_table(tables: &[Item], offset: usize) -> Option<&Item> {
    tables
        .iter()
        .filter(|t| t.is_header())
        .take_while(|t| t.span.start <= offset)
        .last()
}

/// The innermost scalar whose span contains `offset`.
pub fn pair_at(item: &Item, offset: usize) -> Option<&Item> {
    for child in item.values() {
        if !child.span.contains(offset) {
            continue;
        }
        if child.value().is_some() {
            return Some(child);
        }
        if let Some(found) = pair_at(child, offset) {
            return Some(found);
        }
    }
    None
}

/// The dependency whose version literal or name contains `offset`.
pub fn dependency_at(deps: &[Dependency], offset: usize) -> Option<&Dependency> {
    deps.iter()
        .find(|d| d.span.contains(offset))
        .or_else(|| deps.iter().find(|d| d.key_span.contains(offset)))
}

/// The first dependency whose version literal starts on `line`.
pub fn dependency_on_line<'a>(
    deps: &'a [Dependency],
    index: &LineIndex,
    line: u32,
) -> Option<&'a Dependency> {
    deps.iter().find(|d| index.line_of(d.span.start) == line)
}
