//! Diagnostic collection and formatting.
//!
//! Every pass (lexer, parser, type checker) reports problems with the
//! user's MiniC source as [`Diagnostic`] values on a [`Handler`] rather than
//! as `Result::Err` — a malformed program is an expected outcome of a pass,
//! not a defect in the compiler (see the crate-level error types in
//! [`crate::error`] for the latter). The rendered form matches
//! `>>> <kind> error found at line <L>: <message>` followed by the source
//! line and a caret, mirroring the one diagnostic format every stage of the
//! pipeline shares.

use crate::span::Span;
use std::fmt;

/// Which stage raised the diagnostic; controls the `<kind>` word in the
/// rendered message. Lexical errors render as `Syntax`, matching how the
/// rest of the pipeline treats "the source didn't even lex" and "the source
/// didn't parse" as the same user-facing category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Syntax,
    Semantic,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Syntax => write!(f, "Syntax"),
            Kind::Semantic => write!(f, "Semantic"),
        }
    }
}

/// A single compiler diagnostic: a kind, a message, and the source location
/// it refers to.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: Kind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: Kind::Syntax,
            message: message.into(),
            span,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: Kind::Semantic,
            message: message.into(),
            span,
        }
    }

    /// Render this diagnostic against `source`, producing the
    /// `>>> <kind> error found at line <L>: <message>\n<source-line>\n<spaces>^\n`
    /// format shared by every stage.
    pub fn render(&self, source: &str) -> String {
        let line_text = source.lines().nth(self.span.line.saturating_sub(1) as usize).unwrap_or("");
        let caret_indent = " ".repeat(self.span.column.saturating_sub(1) as usize);
        format!(
            "\n>>> {} error found at line {}: {}\n{}\n{}^\n",
            self.kind, self.span.line, self.message, line_text, caret_indent
        )
    }
}

/// Collects diagnostics for one pass and tracks the pipeline's
/// strict/non-strict mode (see the error-handling design: strict mode turns
/// the first diagnostic into an immediate failure; non-strict mode records
/// it and keeps going so later passes can report more of the program).
#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
    strict: bool,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            diagnostics: Vec::new(),
            strict: true,
        }
    }

    /// Report a diagnostic. In strict mode this returns `Err` immediately
    /// with the rendered message against `source`; in non-strict mode it is
    /// recorded and `Ok(())` is returned so the caller can keep going.
    pub fn emit(&mut self, diagnostic: Diagnostic, source: &str) -> Result<(), String> {
        if self.strict {
            return Err(diagnostic.render(source));
        }
        self.diagnostics.push(diagnostic);
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_matches_expected_shape() {
        let diag = Diagnostic::syntax("Expected ';' after expression", Span::new(0, 0, 1, 14));
        let rendered = diag.render("x = 5 output(x);");
        assert!(rendered.starts_with("\n>>> Syntax error found at line 1: Expected ';' after expression\n"));
        assert!(rendered.ends_with("^\n"));
    }

    #[test]
    fn non_strict_handler_accumulates() {
        let mut handler = Handler::new();
        handler.emit(Diagnostic::semantic("first", Span::DUMMY), "").unwrap();
        handler.emit(Diagnostic::semantic("second", Span::DUMMY), "").unwrap();
        assert_eq!(handler.all().len(), 2);
        assert_eq!(handler.first().unwrap().message, "first");
    }

    #[test]
    fn strict_handler_fails_on_first_diagnostic() {
        let mut handler = Handler::strict();
        let result = handler.emit(Diagnostic::syntax("bad token", Span::new(0, 0, 3, 1)), "a\nb\nc");
        assert!(result.is_err());
        assert!(!handler.has_errors());
    }
}
