mod dependency;
mod item;
mod lexer;
mod line_index;
mod parser;
pub mod query;

pub use dependency::{filter_crates, Dependency, DependencyTable};
pub use item::{bare_key, split_key, Item, Node, ScalarKind, Span, TableStyle};
pub use line_index::LineIndex;
pub use parser::{parse, ParseError, ParseResult};
