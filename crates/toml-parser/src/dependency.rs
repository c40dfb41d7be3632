use crate::item::{bare_key, split_key, Item, Span};

/// Which dependency table this belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DependencyTable {
    /// [dependencies]
    #[default]
    Dependencies,
    /// [dev-dependencies]
    DevDependencies,
    /// [build-dependencies]
    BuildDependencies,
    /// [workspace.dependencies]
    Workspace,
}

impl DependencyTable {
    /// Parse from a single header segment
    pub fn from_segment(s: &str) -> Option<Self> {
        match s {
            "dependencies" => Some(Self::Dependencies),
            "dev-dependencies" => Some(Self::DevDependencies),
            "build-dependencies" => Some(Self::BuildDependencies),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "dev-dependencies",
            Self::BuildDependencies => "build-dependencies",
            Self::Workspace => "workspace.dependencies",
        }
    }
}

/// A registry dependency whose version can be looked up and rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Registry name, after any `package = "..."` rename
    pub name: String,
    /// Version requirement as written, without quotes
    pub version: String,
    /// The quoted version literal, delimiters included
    pub span: Span,
    /// Where the dependency is named in the document
    pub key_span: Span,
    /// Alternate registry name, if any
    pub registry: Option<String>,
    pub table: DependencyTable,
    /// Target cfg or triple for `[target.<platform>.*]` tables, unquoted
    pub platform: Option<String>,
    pub features: Vec<String>,
    pub features_span: Option<Span>,
}

impl Dependency {
    /// Unique ID for this dependency, e.g. `target.cfg(unix).dependencies.serde`
    pub fn id(&self) -> String {
        match &self.platform {
            Some(platform) => format!("target.{}.{}.{}", platform, self.table.as_str(), self.name),
            None => format!("{}.{}", self.table.as_str(), self.name),
        }
    }

    /// `true` for the `"?"` placeholder that asks for the latest version
    pub fn is_placeholder(&self) -> bool {
        self.version.trim() == "?"
    }
}

/// Where a header sits relative to the dependency tables.
#[derive(Debug, PartialEq, Eq)]
enum HeaderKind {
    /// `[dependencies]`, `[target.x.dev-dependencies]`, `[workspace.dependencies]`
    Table {
        table: DependencyTable,
        platform: Option<String>,
    },
    /// `[dependencies.serde]` and friends
    Exploded {
        table: DependencyTable,
        platform: Option<String>,
        name: String,
    },
}

fn classify_header(key: &str) -> Option<HeaderKind> {
    let segments = split_key(key);
    let (prefix, rest) = match segments.as_slice() {
        [first, second, ..] if first == "package" && second == "metadata" => return None,
        [first, cfg, rest @ ..] if first == "target" => (Some(cfg.clone()), rest),
        [first, rest @ ..] if first == "workspace" => {
            return match rest {
                [deps] if deps == "dependencies" => Some(HeaderKind::Table {
                    table: DependencyTable::Workspace,
                    platform: None,
                }),
                [deps, name] if deps == "dependencies" => Some(HeaderKind::Exploded {
                    table: DependencyTable::Workspace,
                    platform: None,
                    name: name.clone(),
                }),
                _ => None,
            };
        }
        rest => (None, rest),
    };

    match rest {
        [kind] => Some(HeaderKind::Table {
            table: DependencyTable::from_segment(kind)?,
            platform: prefix,
        }),
        [kind, name] => Some(HeaderKind::Exploded {
            table: DependencyTable::from_segment(kind)?,
            platform: prefix,
            name: name.clone(),
        }),
        _ => None,
    }
}

/// Flatten the header tables of a manifest into registry dependencies,
/// ordered by the offset of their version literal.
pub fn filter_crates(tables: &[Item]) -> Vec<Dependency> {
    let mut deps = Vec::new();
    for table in tables.iter().filter(|t| t.is_header()) {
        match classify_header(&table.key) {
            Some(HeaderKind::Table { table: kind, platform }) => {
                collect_table(table, kind, platform.as_deref(), &mut deps);
            }
            Some(HeaderKind::Exploded {
                table: kind,
                platform,
                name,
            }) => {
                let fields = table.values().iter().map(|f| (f.key.as_str(), f));
                if let Some(dep) = build(&name, table.key_span, fields, None, kind, platform) {
                    deps.push(dep);
                }
            }
            None => {}
        }
    }
    deps.sort_by_key(|d| d.span.start);
    deps
}

fn collect_table(
    table: &Item,
    kind: DependencyTable,
    platform: Option<&str>,
    out: &mut Vec<Dependency>,
) {
    // dotted keys (`serde.version = "1"`) grouped by crate, in order of appearance
    let mut dotted: Vec<(String, Span, Vec<(String, &Item)>)> = Vec::new();

    for child in table.values() {
        let segments = split_key(&child.key);
        if let [name, field] = segments.as_slice() {
            match dotted.iter_mut().find(|(n, _, _)| n == name) {
                Some((_, _, fields)) => fields.push((field.clone(), child)),
                None => dotted.push((name.clone(), child.key_span, vec![(field.clone(), child)])),
            }
            continue;
        }
        if segments.len() != 1 {
            continue;
        }

        let platform = platform.map(str::to_string);
        if let Some(version) = child.str_value() {
            out.push(Dependency {
                name: segments[0].clone(),
                version: version.to_string(),
                span: child.span,
                key_span: child.key_span,
                registry: None,
                table: kind,
                platform,
                features: Vec::new(),
                features_span: None,
            });
        } else if child.is_inline_table() {
            let fields = child.values().iter().map(|f| (f.key.as_str(), f));
            if let Some(dep) = build(
                &segments[0],
                child.key_span,
                fields,
                child.registry.clone(),
                kind,
                platform,
            ) {
                out.push(dep);
            }
        }
    }

    for (name, key_span, fields) in &dotted {
        let fields = fields.iter().map(|(k, v)| (k.as_str(), *v));
        if let Some(dep) = build(
            name,
            *key_span,
            fields,
            None,
            kind,
            platform.map(str::to_string),
        ) {
            out.push(dep);
        }
    }
}

fn build<'a>(
    declared: &str,
    key_span: Span,
    fields: impl Iterator<Item = (&'a str, &'a Item)>,
    registry: Option<String>,
    table: DependencyTable,
    platform: Option<String>,
) -> Option<Dependency> {
    let mut name = declared.to_string();
    let mut version = None;
    let mut registry = registry;
    let mut features = Vec::new();
    let mut features_span = None;

    for (field, item) in fields {
        let Some(field) = bare_key(field) else {
            continue;
        };
        match field.as_str() {
            "workspace" | "path" | "git" => return None,
            "version" => version = item.str_value().map(|v| (v.to_string(), item.span)),
            "package" => {
                if let Some(package) = item.str_value() {
                    name = package.to_string();
                }
            }
            "registry" => registry = item.str_value().map(str::to_string),
            "features" => {
                features = item
                    .values()
                    .iter()
                    .filter_map(|f| f.str_value().map(str::to_string))
                    .collect();
                features_span = Some(item.span);
            }
            _ => {}
        }
    }

    let (version, span) = version?;
    Some(Dependency {
        name,
        version,
        span,
        key_span,
        registry,
        table,
        platform,
        features,
        features_span,
    })
}
