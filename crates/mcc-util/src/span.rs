//! Source locations.

use std::fmt;

/// A half-open byte range in a source file, plus the 1-based line/column of
/// its first byte (precomputed at lex time so downstream passes never need
/// to re-scan the source to render a diagnostic).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const DUMMY: Span = Span {
        start: 0,
        end: 0,
        line: 0,
        column: 0,
    };

    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A zero-width span at a single line/column, used for synthesized
    /// diagnostics that have no underlying source range (e.g. a built-in).
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(0, 0, line, column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Translates byte offsets into line/column pairs for a single source file.
///
/// Built once per compilation from the raw source text; the lexer consults
/// it whenever it needs to stamp a token or diagnostic with human-readable
/// position information.
pub struct LineIndex {
    /// Byte offset of the first character of each line (line 0 is offset 0).
    line_starts: Vec<usize>,
    source_len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            line_starts,
            source_len: source.len(),
        }
    }

    /// 1-based (line, column) for a byte offset into the indexed source.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source_len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_at) => insert_at - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32 + 1, column as u32 + 1)
    }

    pub fn span_at(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.line_col(start);
        Span::new(start, end, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_first_column() {
        let idx = LineIndex::new("abc\ndef\n");
        assert_eq!(idx.line_col(0), (1, 1));
    }

    #[test]
    fn second_line() {
        let idx = LineIndex::new("abc\ndef\n");
        assert_eq!(idx.line_col(4), (2, 1));
        assert_eq!(idx.line_col(5), (2, 2));
    }

    #[test]
    fn offset_at_eof_clamped() {
        let idx = LineIndex::new("abc");
        let (line, column) = idx.line_col(100);
        assert_eq!(line, 1);
        assert_eq!(column, 4);
    }
}
