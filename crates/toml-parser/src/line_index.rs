use tower_lsp::lsp_types::{Position, Range};

use crate::item::Span;

/// Maps byte offsets of a document to LSP positions (UTF-16 columns) and back.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    text: String,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line containing `offset`, zero based
    pub fn line_of(&self, offset: usize) -> u32 {
        let offset = offset.min(self.text.len());
        (self.line_starts.partition_point(|start| *start <= offset) - 1) as u32
    }

    /// Byte span of a line without its line terminator
    pub fn line_span(&self, line: u32) -> Option<Span> {
        let start = *self.line_starts.get(line as usize)?;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map_or(self.text.len(), |next| next - 1);
        let end = if self.text[start..end].ends_with('\r') {
            end - 1
        } else {
            end
        };
        Some(Span::new(start, end))
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = floor_char_boundary(&self.text, offset.min(self.text.len()));
        let line = self.line_of(offset);
        let start = self.line_starts[line as usize];
        let character = self.text[start..offset].encode_utf16().count() as u32;
        Position::new(line, character)
    }

    /// Byte offset of a position. Columns past the end of a line clamp to it.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let span = self.line_span(position.line)?;
        let mut units = 0u32;
        for (i, ch) in self.text[span.range()].char_indices() {
            if units >= position.character {
                return Some(span.start + i);
            }
            units += ch.len_utf16() as u32;
        }
        Some(span.end)
    }

    pub fn range(&self, span: Span) -> Range {
        Range::new(self.position(span.start), self.position(span.end))
    }

    /// Byte span of an LSP range
    pub fn span(&self, range: Range) -> Option<Span> {
        Some(Span::new(self.offset(range.start)?, self.offset(range.end)?))
    }
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
