//! Error types for MIPS code generation.
//!
//! These only cover internal invariant violations: the generator assumes it
//! is handed an AST that already passed type checking, so every case here
//! indicates a symbol the checker should have resolved and didn't — a bug
//! in this crate or in the caller, never a user program mistake.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeGenError {
    /// A name had no entry in the symbol table being built during code
    /// generation.
    #[error("undefined symbol '{0}' encountered during code generation")]
    UndefinedSymbol(String),

    /// A function call's callee never resolved to a known function symbol.
    #[error("function '{0}' has no entry in the symbol table")]
    UndefinedFunction(String),
}

pub type Result<T> = std::result::Result<T, CodeGenError>;
