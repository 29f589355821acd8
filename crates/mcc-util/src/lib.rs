//! Shared infrastructure for the MiniC compiler pipeline.
//!
//! Every other crate in this workspace (`mcc-lex`, `mcc-par`, `mcc-sem`,
//! `mcc-gen`, `mcc-drv`) depends on this one for:
//!
//! - [`Symbol`]: interned identifiers, compared by index instead of by string.
//! - [`Span`] / [`LineIndex`]: source locations and offset-to-line/column
//!   translation.
//! - [`Diagnostic`] / [`Handler`]: the diagnostic record and collection
//!   discipline shared by the lexer, parser, and type checker.

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Kind as DiagnosticKind};
pub use span::{LineIndex, Span};
pub use symbol::Symbol;
