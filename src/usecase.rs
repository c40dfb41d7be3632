mod document;
mod registries;
mod workspace;

pub use document::Document;
pub use registries::{build_lookup, build_registries, cargo_home, discover_registries, DiscoveredRegistry};
pub use workspace::Workspace;
