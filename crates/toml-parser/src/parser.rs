use thiserror::Error;
use tracing::debug;

use crate::item::{bare_key, Item, Node, ScalarKind, Span, TableStyle};
use crate::lexer::{
    is_bare_key_char, is_comma, is_comment, is_ignored_line, is_newline, is_quote, is_token_char,
    is_whitespace, starts_boolean, starts_number,
};

/// Result of parsing a manifest. Parsing never fails as a whole: malformed
/// regions are reported in `errors` and simply contribute nothing to `root`.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub root: Item,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Top-level items in document order: root pairs followed by header tables.
    pub fn tables(&self) -> &[Item] {
        self.root.values()
    }
}

/// A malformed region of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Parse manifest text into a tree of tables and pairs with exact byte offsets.
pub fn parse(text: &str) -> ParseResult {
    let mut scanner = Scanner::new(text);
    // offsets stay relative to the full text, BOM included
    if text.starts_with('\u{feff}') {
        scanner.pos = '\u{feff}'.len_utf8();
    }
    let mut root = Item::root(text.len());
    scanner.parse_tables(&mut root);
    ParseResult {
        root,
        errors: scanner.errors,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    /// Pairs of a header table, ended by the next header
    Header,
    /// Pairs of an inline table, ended by `}`
    Brace,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&mut self, message: impl Into<String>, start: usize, end: usize) {
        let err = ParseError::new(message, Span::new(start, end.min(self.len())));
        debug!("toml degradation at {:?}: {}", err.span, err.message);
        self.errors.push(err);
    }

    fn skip_to_eol(&mut self) {
        while let Some(b) = self.peek() {
            if is_newline(b) {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Skip whitespace, newlines, commas, comments and ignored lines until
    /// the next significant byte.
    fn skip_blank(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_newline(b) || is_comma(b) {
                self.pos += 1;
            } else if is_comment(b) {
                self.skip_to_eol();
            } else if b != b'[' && is_ignored_line(self.current_line()) {
                debug!("skipping ignored line at {}", self.pos);
                self.skip_to_eol();
            } else {
                break;
            }
        }
    }

    /// Skip separators inside arrays. Comments are allowed between elements.
    fn skip_array_blank(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_newline(b) || is_comma(b) {
                self.pos += 1;
            } else if is_comment(b) {
                self.skip_to_eol();
            } else {
                break;
            }
        }
    }

    fn line_bounds(&self) -> (usize, usize) {
        let pos = self.pos.min(self.len());
        let start = self.text[..pos].rfind('\n').map_or(0, |i| i + 1);
        let end = self.text[pos..].find('\n').map_or(self.len(), |i| pos + i);
        (start, end)
    }

    fn current_line(&self) -> &'a str {
        let (start, end) = self.line_bounds();
        self.text[start..end].trim_end_matches('\r')
    }

    fn at_line_start(&self) -> bool {
        let (start, _) = self.line_bounds();
        self.bytes[start..self.pos].iter().all(|b| is_whitespace(*b))
    }

    fn looks_like_header(&self) -> bool {
        if !self.at_line_start() {
            return false;
        }
        let line = self.current_line().trim();
        let line = line.split('#').next().unwrap_or_default().trim_end();
        let Some(inner) = line.strip_prefix('[') else {
            return false;
        };
        let inner = inner.trim_start_matches('[').trim_start();
        line.ends_with(']')
            && !inner.contains(',')
            && inner.bytes().next().is_some_and(is_bare_key_char)
    }

    fn trimmed_span(&self, mut start: usize, mut end: usize) -> Span {
        while start < end && is_whitespace(self.bytes[start]) {
            start += 1;
        }
        while end > start && is_whitespace(self.bytes[end - 1]) {
            end -= 1;
        }
        Span::new(start, end)
    }

    fn parse_tables(&mut self, root: &mut Item) {
        // pairs written before the first header belong to the root
        self.parse_pairs(root, Terminator::Header);

        while let Some(b) = self.peek() {
            if b != b'[' {
                self.pos += 1;
                continue;
            }
            let start = self.pos;
            match self.parse_header() {
                Some((key, key_span, style)) => {
                    let mut table = Item::table(key, key_span, Span::new(start, start), style);
                    self.parse_pairs(&mut table, Terminator::Header);
                    table.span.end = self.pos;
                    root.push(table);
                }
                None => {
                    // pairs under a broken header have no table to live in
                    let mut orphan = Item::root(0);
                    self.parse_pairs(&mut orphan, Terminator::Header);
                }
            }
        }
    }

    /// Parse `[name]` or `[[name]]` and the rest of its line.
    fn parse_header(&mut self) -> Option<(String, Span, TableStyle)> {
        let open = self.pos;
        let style = if self.bytes.get(open + 1) == Some(&b'[') {
            self.pos += 2;
            TableStyle::ArrayHeader
        } else {
            self.pos += 1;
            TableStyle::Header
        };

        let key_start = self.pos;
        let mut quote: Option<u8> = None;
        loop {
            let Some(b) = self.peek() else {
                self.error("unterminated table header", open, self.len());
                return None;
            };
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) if is_newline(b) => {
                    self.error("unterminated quoted table name", open, self.pos);
                    return None;
                }
                Some(_) => {}
                None if is_quote(b) => quote = Some(b),
                None if b == b']' => break,
                None if is_newline(b) => {
                    self.error("unterminated table header", open, self.pos);
                    return None;
                }
                None => {}
            }
            self.pos += 1;
        }
        let key_end = self.pos;
        self.pos += 1;
        if style == TableStyle::ArrayHeader && self.peek() == Some(b']') {
            self.pos += 1;
        }

        self.skip_inline_whitespace();
        match self.peek() {
            None => {}
            Some(b) if is_newline(b) => {}
            Some(b) if is_comment(b) => self.skip_to_eol(),
            Some(_) => {
                let start = self.pos;
                self.skip_to_eol();
                self.error("unexpected characters after table header", start, self.pos);
            }
        }

        let key = normalize_key(&self.text[key_start..key_end]);
        if key.is_empty() {
            self.error("empty table name", open, key_end + 1);
            return None;
        }
        Some((key, self.trimmed_span(key_start, key_end), style))
    }

    /// Parse key/value pairs into `parent` until the terminator. Returns
    /// false if input ran out (or a header began) before a `}` terminator.
    fn parse_pairs(&mut self, parent: &mut Item, term: Terminator) -> bool {
        loop {
            self.skip_blank();
            let Some(b) = self.peek() else {
                return term == Terminator::Header;
            };
            match (term, b) {
                (Terminator::Header, b'[') => return true,
                (Terminator::Brace, b'}') => {
                    self.pos += 1;
                    return true;
                }
                (Terminator::Brace, b'[') => return false,
                _ => self.parse_pair(parent, term),
            }
        }
    }

    fn parse_pair(&mut self, parent: &mut Item, term: Terminator) {
        let key_start = self.pos;
        let mut quote: Option<u8> = None;
        while let Some(b) = self.peek() {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) if is_newline(b) => break,
                Some(_) => {}
                None if is_quote(b) => quote = Some(b),
                None if b == b'=' || is_newline(b) => break,
                None if term == Terminator::Brace && b == b'}' => break,
                None => {}
            }
            self.pos += 1;
        }

        if self.peek() != Some(b'=') {
            self.error("expected `=` after key", key_start, self.pos);
            if self.peek() != Some(b'}') {
                self.skip_to_eol();
            }
            return;
        }

        let key = normalize_key(&self.text[key_start..self.pos]);
        let key_span = self.trimmed_span(key_start, self.pos);
        if key.is_empty() {
            self.error("missing key before `=`", key_start, self.pos + 1);
            self.skip_to_eol();
            return;
        }

        self.pos += 1;
        self.skip_inline_whitespace();
        if let Some(item) = self.parse_value(key, key_span) {
            parent.push(item);
        }
    }

    fn parse_value(&mut self, key: String, key_span: Span) -> Option<Item> {
        let start = self.pos;
        let b = match self.peek() {
            Some(b) if !is_newline(b) && !is_comment(b) => b,
            _ => {
                self.error(format!("missing value for `{}`", key), key_span.start, start);
                return None;
            }
        };

        match b {
            b'"' | b'\'' => self.parse_string(key, key_span),
            b'[' => self.parse_array(key, key_span),
            b'{' => self.parse_inline_table(key, key_span),
            _ if starts_boolean(self.bytes, start) => {
                Some(self.parse_token(key, key_span, ScalarKind::Boolean))
            }
            _ if starts_number(self.bytes, start) => {
                Some(self.parse_token(key, key_span, ScalarKind::Number))
            }
            _ => {
                while let Some(b) = self.peek() {
                    if is_newline(b) || is_comma(b) || b == b'}' || b == b']' {
                        break;
                    }
                    self.pos += 1;
                }
                // a delimiter right at the value belongs to the enclosing item
                if self.pos == start && !matches!(b, b',' | b'}' | b']') {
                    self.pos = (start + 1).min(self.len());
                }
                self.error(format!("unsupported value for `{}`", key), start, self.pos);
                None
            }
        }
    }

    /// Scan a single or triple quoted string. The stored value is the raw
    /// text between the delimiters; escapes are not interpreted.
    fn parse_string(&mut self, key: String, key_span: Span) -> Option<Item> {
        let start = self.pos;
        let q = self.bytes[start];
        let basic = q == b'"';

        if self.bytes[start..].starts_with(&[q, q, q]) {
            let content_start = start + 3;
            let mut i = content_start;
            while i < self.len() {
                let b = self.bytes[i];
                if basic && b == b'\\' {
                    i += 2;
                    continue;
                }
                if self.bytes[i..].starts_with(&[q, q, q]) {
                    break;
                }
                i += 1;
            }
            if i >= self.len() {
                self.pos = self.len();
                self.error("unterminated multi-line string", start, self.len());
                return None;
            }
            // up to two quotes may sit right before the closing delimiter
            let mut close = i;
            while close < i + 2 && self.bytes.get(close + 3) == Some(&q) {
                close += 1;
            }
            self.pos = close + 3;
            let value = self.text[content_start..close].to_string();
            return Some(Item::scalar(
                key,
                key_span,
                Span::new(start, self.pos),
                value,
                ScalarKind::MultilineString,
            ));
        }

        let mut i = start + 1;
        while i < self.len() {
            let b = self.bytes[i];
            if basic && b == b'\\' && self.bytes.get(i + 1).is_some_and(|n| !is_newline(*n)) {
                i += 2;
                continue;
            }
            if b == q || is_newline(b) {
                break;
            }
            i += 1;
        }
        if i >= self.len() || self.bytes[i] != q {
            self.pos = i.min(self.len());
            self.error("unterminated string", start, self.pos);
            return None;
        }
        self.pos = i + 1;
        let value = self.text[start + 1..i].to_string();
        Some(Item::scalar(
            key,
            key_span,
            Span::new(start, self.pos),
            value,
            ScalarKind::String,
        ))
    }

    fn parse_token(&mut self, key: String, key_span: Span, kind: ScalarKind) -> Item {
        let start = self.pos;
        while self.peek().is_some_and(is_token_char) {
            self.pos += 1;
        }
        let value = self.text[start..self.pos].to_string();
        Item::scalar(key, key_span, Span::new(start, self.pos), value, kind)
    }

    fn parse_array(&mut self, key: String, key_span: Span) -> Option<Item> {
        let start = self.pos;
        self.pos += 1;
        let mut array = Item {
            key,
            key_span,
            span: Span::new(start, start),
            registry: None,
            node: Node::Array {
                elements: Vec::new(),
            },
        };

        loop {
            self.skip_array_blank();
            let Some(b) = self.peek() else {
                self.error("unterminated array", start, self.len());
                return None;
            };
            let element = match b {
                b']' => {
                    self.pos += 1;
                    array.span.end = self.pos;
                    return Some(array);
                }
                b'[' if self.looks_like_header() => {
                    self.error("unterminated array", start, self.pos);
                    return None;
                }
                b'"' | b'\'' => self.parse_string(String::new(), Span::default()),
                b'[' => self.parse_array(String::new(), Span::default()),
                b'{' => self.parse_inline_table(String::new(), Span::default()),
                _ if starts_boolean(self.bytes, self.pos) => Some(self.parse_token(
                    String::new(),
                    Span::default(),
                    ScalarKind::Boolean,
                )),
                _ if starts_number(self.bytes, self.pos) => Some(self.parse_token(
                    String::new(),
                    Span::default(),
                    ScalarKind::Number,
                )),
                _ => {
                    let bad = self.pos;
                    while let Some(b) = self.peek() {
                        if is_comma(b) || b == b']' || is_newline(b) {
                            break;
                        }
                        self.pos += 1;
                    }
                    self.pos = self.pos.max(bad + 1).min(self.len());
                    self.error("unsupported array element", bad, self.pos);
                    None
                }
            };
            if let Some(element) = element {
                array.push(element);
            }
        }
    }

    fn parse_inline_table(&mut self, key: String, key_span: Span) -> Option<Item> {
        let start = self.pos;
        self.pos += 1;
        let mut table = Item::table(key, key_span, Span::new(start, start), TableStyle::Inline);
        if !self.parse_pairs(&mut table, Terminator::Brace) {
            self.error("unterminated inline table", start, self.pos);
            return None;
        }
        table.span.end = self.pos;
        if !apply_dependency_rule(&mut table) {
            debug!("dropping non-registry inline table `{}`", table.key);
            return None;
        }
        Some(table)
    }
}

/// Inline dependency tables pointing at `git` or `path` sources cannot be
/// resolved against a registry and are dropped. `package` renames the owning
/// item and `registry` is recorded for alternate-registry lookups.
fn apply_dependency_rule(table: &mut Item) -> bool {
    let mut rename = None;
    let mut registry = None;
    for field in table.values() {
        match bare_key(&field.key).as_deref() {
            Some("git" | "path") => return false,
            Some("package") => rename = field.str_value().map(str::to_string),
            Some("registry") => registry = field.str_value().map(str::to_string),
            _ => {}
        }
    }
    if let Some(name) = rename {
        table.key = name;
    }
    table.registry = registry;
    true
}

/// Remove whitespace outside of quotes, keeping quoted segments verbatim.
fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut quote: Option<char> = None;
    for ch in raw.chars() {
        match quote {
            Some(q) if ch == q => {
                quote = None;
                out.push(ch);
            }
            Some(_) => out.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                out.push(ch);
            }
            None if ch.is_whitespace() => {}
            None => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice<'a>(text: &'a str, span: Span) -> &'a str {
        &text[span.range()]
    }

    #[test]
    fn test_parse_tables_and_pairs() {
        let toml = r#"[package]
name = "demo"
version = "0.1.0"

[dependencies]
serde = "1.0"
"#;
        let result = parse(toml);
        assert!(result.errors.is_empty(), "{:?}", result.errors);

        let tables = result.tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].key, "package");
        assert_eq!(tables[0].values().len(), 2);
        assert_eq!(tables[1].key, "dependencies");

        let serde = tables[1].get("serde").unwrap();
        assert_eq!(serde.value(), Some("1.0"));
        assert_eq!(slice(toml, serde.span), "\"1.0\"");
        assert_eq!(slice(toml, serde.key_span), "serde");
    }

    #[test]
    fn test_table_span_runs_to_next_header() {
        let toml = "[package]\nname = \"a\"\n\n[dependencies]\n";
        let result = parse(toml);
        let package = &result.tables()[0];
        assert_eq!(package.span.start, 0);
        assert_eq!(package.span.end, toml.find("[dependencies]").unwrap());
        assert_eq!(slice(toml, package.key_span), "package");

        let deps = &result.tables()[1];
        assert_eq!(deps.span.end, toml.len());
        assert!(deps.values().is_empty());
    }

    #[test]
    fn test_header_spelling() {
        let toml = r#"[ target.'cfg(target_os = "android")'.dependencies ]
jni = "0.21"

[[bin]]
name = "demo"
"#;
        let result = parse(toml);
        let tables = result.tables();
        assert_eq!(
            tables[0].key,
            r#"target.'cfg(target_os = "android")'.dependencies"#
        );
        assert!(matches!(
            tables[1].node,
            Node::Table {
                style: TableStyle::ArrayHeader,
                ..
            }
        ));
        assert_eq!(tables[1].key, "bin");
    }

    #[test]
    fn test_inline_table() {
        let toml = r#"[dependencies]
serde = { version = "1.0", features = ["derive", "rc"], default-features = false }
"#;
        let result = parse(toml);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let serde = result.tables()[0].get("serde").unwrap();
        assert!(serde.is_inline_table());
        assert_eq!(slice(toml, serde.span), &toml[toml.find('{').unwrap()..toml.find('}').unwrap() + 1]);

        let version = serde.get("version").unwrap();
        assert_eq!(version.value(), Some("1.0"));
        assert_eq!(slice(toml, version.span), "\"1.0\"");

        let features = serde.get("features").unwrap();
        let names: Vec<_> = features.values().iter().filter_map(|f| f.value()).collect();
        assert_eq!(names, vec!["derive", "rc"]);

        assert_eq!(serde.get("default-features").unwrap().bool_value(), Some(false));
    }

    #[test]
    fn test_inline_table_rules() {
        let toml = r#"[dependencies]
local = { path = "../local", version = "0.1" }
remote = { git = "https://example.com/remote.git" }
bar = { package = "real-bar", version = "1.0" }
internal = { version = "2", registry = "my-registry" }
"#;
        let result = parse(toml);
        let deps = &result.tables()[0];
        let keys: Vec<_> = deps.values().iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, vec!["real-bar", "internal"]);
        assert_eq!(deps.values()[1].registry.as_deref(), Some("my-registry"));
    }

    #[test]
    fn test_multiline_string_and_scalars() {
        let toml = "[package]\ndescription = \"\"\"\nline one\nline \"two\"\n\"\"\"\npublish = false\nrank = -3\nname = 'lit\\eral'\n";
        let result = parse(toml);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let package = &result.tables()[0];
        let description = package.get("description").unwrap();
        assert_eq!(description.value(), Some("\nline one\nline \"two\"\n"));
        assert_eq!(package.get("publish").unwrap().bool_value(), Some(false));
        assert_eq!(package.get("rank").unwrap().value(), Some("-3"));
        assert_eq!(package.get("name").unwrap().value(), Some("lit\\eral"));
    }

    #[test]
    fn test_escaped_quote_is_kept_verbatim() {
        let toml = "[package]\ndescription = \"say \\\"hi\\\"\"\n";
        let result = parse(toml);
        let description = result.tables()[0].get("description").unwrap();
        assert_eq!(description.value(), Some("say \\\"hi\\\""));
    }

    #[test]
    fn test_comments_are_skipped() {
        let toml = "# leading\n[dependencies] # trailing\n# serde = \"0.9\"\nserde = \"1.0\" # pinned\n";
        let result = parse(toml);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let deps = &result.tables()[0];
        assert_eq!(deps.values().len(), 1);
        assert_eq!(deps.values()[0].value(), Some("1.0"));
    }

    #[test]
    fn test_conflict_markers_and_disabled_lines() {
        let toml = r#"[dependencies]
<<<<<<< HEAD
serde = "1.0"
=======
serde = "1.1"
>>>>>>> feature
tokio = "1" # crates: disable-check
log = "0.4"
"#;
        let result = parse(toml);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let values: Vec<_> = result.tables()[0]
            .values()
            .iter()
            .map(|v| (v.key.as_str(), v.value().unwrap()))
            .collect();
        assert_eq!(values, vec![("serde", "1.0"), ("serde", "1.1"), ("log", "0.4")]);
    }

    #[test]
    fn test_unterminated_input_does_not_panic() {
        for toml in [
            "[dependencies",
            "[dependencies]\nserde = \"1.0",
            "[dependencies]\nserde = { version = \"1.0\"",
            "[dependencies]\nserde = [\"a\", ",
            "[dependencies]\nserde = '''never closed",
            "[dependencies]\nserde =",
            "[dependencies]\nserde",
            "= \"1\"",
            "[]",
        ] {
            let result = parse(toml);
            assert!(!result.errors.is_empty(), "expected degradation for {:?}", toml);
        }
    }

    #[test]
    fn test_degradation_is_local() {
        let toml = "[dependencies]\nbroken = \"1.0\nserde = \"1.0\"\n\n[dev-dependencies]\ntempfile = \"3\"\n";
        let result = parse(toml);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.tables()[0].values().len(), 1);
        assert_eq!(result.tables()[0].values()[0].key, "serde");
        assert_eq!(result.tables()[1].values()[0].key, "tempfile");
    }

    #[test]
    fn test_missing_inline_value_keeps_siblings() {
        let toml = "[dependencies]\na = { x = }\nb = \"2\"\nc = { y = , version = \"3\" }\n";
        let result = parse(toml);
        assert_eq!(result.errors.len(), 2);
        let keys: Vec<_> = result.tables()[0].values().iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        let c = result.tables()[0].get("c").unwrap();
        assert_eq!(c.get("version").unwrap().value(), Some("3"));
    }

    #[test]
    fn test_quoted_field_names() {
        let toml = "[dependencies]\nlocal = { version = \"1\", \"path\" = \"../x\" }\nalt = { \"registry\" = \"corp\", version = \"2\" }\n";
        let result = parse(toml);
        let keys: Vec<_> = result.tables()[0].values().iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["alt"]);
        assert_eq!(result.tables()[0].values()[0].registry.as_deref(), Some("corp"));
    }

    #[test]
    fn test_leading_bom() {
        let toml = "\u{feff}[dependencies]\nserde = \"1\"\n";
        let result = parse(toml);
        assert!(result.errors.is_empty());
        assert_eq!(result.tables()[0].key, "dependencies");
        let serde = result.tables()[0].get("serde").unwrap();
        assert_eq!(slice(toml, serde.span), "\"1\"");
    }

    #[test]
    fn test_unterminated_inline_table_stops_at_header() {
        let toml = "[dependencies]\nserde = { version = \"1.0\"\n[dev-dependencies]\ntempfile = \"3\"\n";
        let result = parse(toml);
        assert_eq!(result.errors.len(), 1);
        assert!(result.tables()[0].values().is_empty());
        assert_eq!(result.tables()[1].key, "dev-dependencies");
        assert_eq!(result.tables()[1].values()[0].value(), Some("3"));
    }

    #[test]
    fn test_root_pairs_before_first_header() {
        let toml = "cargo-features = [\"edition2024\"]\n[package]\nname = \"x\"\n";
        let result = parse(toml);
        assert_eq!(result.root.values().len(), 2);
        assert_eq!(result.root.tables().count(), 1);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let toml = r#"[dependencies]
serde = { version = "1.0", features = ["derive"] }
log = "0.4"
"#;
        assert_eq!(parse(toml).root, parse(toml).root);
    }

    #[test]
    fn test_multibyte_text() {
        let toml = "[package]\ndescription = \"héllo wörld\"\n\n[dependencies]\nserde = \"1.0\"\n";
        let result = parse(toml);
        let serde = result.tables()[1].get("serde").unwrap();
        assert_eq!(slice(toml, serde.span), "\"1.0\"");
        assert_eq!(
            result.tables()[0].get("description").unwrap().value(),
            Some("héllo wörld")
        );
    }
}
