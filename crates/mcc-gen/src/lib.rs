//! MIPS assembly code generation for MiniC.
//!
//! Lowers a type-checked AST directly to SPIM-compatible MIPS text — no
//! intermediate representation, since the target is stack-machine-shaped
//! assembly rather than a register-allocated architecture that would
//! benefit from one. Callers must only invoke [`asm::CodeGenerator`] on an
//! AST that already passed [`mcc_sem::TypeChecker::check`]; behavior on an
//! ill-typed AST is unspecified.

pub mod asm;
pub mod error;

pub use asm::CodeGenerator;
pub use error::{CodeGenError, Result};
