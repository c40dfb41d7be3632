use std::ops::Range;

/// Byte offsets into the manifest text. `end` is exclusive, so
/// `&text[span.start..span.end]` is the exact source of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inclusive on both ends: a cursor right after the closing quote still
    /// belongs to the literal.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// The span with one delimiter byte trimmed from each side, used to
    /// address the inside of a quoted literal.
    pub fn inner(&self) -> Span {
        if self.len() < 2 {
            return *self;
        }
        Span::new(self.start + 1, self.end - 1)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    /// The synthetic document root
    Root,
    /// `[name]`
    Header,
    /// `[[name]]`
    ArrayHeader,
    /// `name = { ... }`
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    MultilineString,
    Boolean,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Table {
        style: TableStyle,
        children: Vec<Item>,
    },
    Array {
        elements: Vec<Item>,
    },
    Scalar {
        value: String,
        kind: ScalarKind,
    },
}

/// A node of the parsed manifest.
///
/// For header tables `key` is the full dotted header spelling, for pairs it is
/// the key as written (whitespace outside quotes removed), for array elements
/// it is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub key_span: Span,
    /// For pairs this is the span of the value; for header tables it runs
    /// from `[` up to the next header.
    pub span: Span,
    /// Alternate registry declared on an inline dependency table
    pub registry: Option<String>,
    pub node: Node,
}

impl Item {
    pub fn root(len: usize) -> Self {
        Self {
            key: String::new(),
            key_span: Span::default(),
            span: Span::new(0, len),
            registry: None,
            node: Node::Table {
                style: TableStyle::Root,
                children: Vec::new(),
            },
        }
    }

    pub fn table(key: String, key_span: Span, span: Span, style: TableStyle) -> Self {
        Self {
            key,
            key_span,
            span,
            registry: None,
            node: Node::Table {
                style,
                children: Vec::new(),
            },
        }
    }

    pub fn scalar(key: String, key_span: Span, span: Span, value: String, kind: ScalarKind) -> Self {
        Self {
            key,
            key_span,
            span,
            registry: None,
            node: Node::Scalar { value, kind },
        }
    }

    /// Scalar text for leaf pairs
    pub fn value(&self) -> Option<&str> {
        match &self.node {
            Node::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Scalar text only if the value was written as a string
    pub fn str_value(&self) -> Option<&str> {
        match &self.node {
            Node::Scalar {
                value,
                kind: ScalarKind::String | ScalarKind::MultilineString,
            } => Some(value),
            _ => None,
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match &self.node {
            Node::Scalar {
                value,
                kind: ScalarKind::Boolean,
            } => Some(value == "true"),
            _ => None,
        }
    }

    /// Table children or array elements; empty for scalars.
    pub fn values(&self) -> &[Item] {
        match &self.node {
            Node::Table { children, .. } => children,
            Node::Array { elements } => elements,
            Node::Scalar { .. } => &[],
        }
    }

    pub(crate) fn push(&mut self, item: Item) {
        match &mut self.node {
            Node::Table { children, .. } => children.push(item),
            Node::Array { elements } => elements.push(item),
            Node::Scalar { .. } => {}
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self.node, Node::Table { .. })
    }

    pub fn is_header(&self) -> bool {
        matches!(
            self.node,
            Node::Table {
                style: TableStyle::Header | TableStyle::ArrayHeader,
                ..
            }
        )
    }

    pub fn is_inline_table(&self) -> bool {
        matches!(
            self.node,
            Node::Table {
                style: TableStyle::Inline,
                ..
            }
        )
    }

    /// First direct child with the given key
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.values().iter().find(|v| v.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Header tables attached to the root, in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Item> {
        self.values().iter().filter(|v| v.is_header())
    }
}

/// Split a dotted key or header on dots outside quotes and unquote each
/// segment. `target.'cfg(unix)'.dependencies` yields
/// `["target", "cfg(unix)", "dependencies"]`.
pub fn split_key(key: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    for ch in key.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => buf.push(c),
            (None, '"' | '\'') => quote = Some(ch),
            (None, '.') => segments.push(std::mem::take(&mut buf)),
            (None, c) if c.is_whitespace() => {}
            (None, c) => buf.push(c),
        }
    }
    segments.push(buf);
    segments
}

/// The unquoted name of a single-segment key, `None` for dotted keys.
pub fn bare_key(key: &str) -> Option<String> {
    let mut segments = split_key(key);
    if segments.len() != 1 {
        return None;
    }
    segments.pop()
}
