//! Driver layer: ties the lexer, parser, type checker, and code generator
//! into the three operations the `mcc` binary exposes.
//!
//! Each operation is self-contained — it builds its own [`Lexer`]/[`Parser`]/
//! [`TypeChecker`] from raw source text rather than threading a previously
//! built AST through a shared session, mirroring how the original compiler's
//! type checker and code generator each built their own parser from the
//! program text handed to their constructor. This also means two
//! compilations can proceed concurrently on disjoint inputs without sharing
//! any mutable state.

use std::fmt;
use std::path::{Path, PathBuf};

use mcc_gen::CodeGenerator;
use mcc_par::{Parser, Program};
use mcc_sem::TypeChecker;
use mcc_util::{Diagnostic, Handler};
use thiserror::Error;

pub mod config;

pub use config::Config;

/// Failures outside the compiler's own diagnostic taxonomy: an I/O problem,
/// or (in strict mode) a `Diagnostic` surfaced as a hard failure because the
/// caller asked every stage to abort on its first error.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("could not read '{0}': {1}")]
    ReadSource(PathBuf, #[source] std::io::Error),

    #[error("could not write '{0}': {1}")]
    WriteOutput(PathBuf, #[source] std::io::Error),

    #[error("{0}")]
    Diagnostic(String),

    #[error("code generation failed: {0}")]
    CodeGen(#[from] mcc_gen::CodeGenError),
}

/// Result of `check_syntax`: whether the source lexes and parses cleanly,
/// and the first diagnostic otherwise.
#[derive(Debug, Clone, Default)]
pub struct SyntaxCheck {
    pub is_syntax_correct: bool,
    pub error: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// Result of `check_typing`: whether the source type-checks, independent of
/// whether it parsed cleanly — the type checker walks whatever AST the
/// parser recovered, exactly as the source it was distilled from did.
#[derive(Debug, Clone, Default)]
pub struct TypingCheck {
    pub valid: bool,
    pub error: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// Result of `compile`: whether the source was accepted, and if not, why.
/// `asm` is only populated when both checks pass.
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub is_syntax_valid: bool,
    pub is_typing_valid: bool,
    pub diagnostic: Option<String>,
    pub asm: Option<String>,
}

fn diagnostic_parts(first: Option<&Diagnostic>) -> (Option<String>, Option<u32>, Option<u32>) {
    match first {
        Some(d) => (Some(d.message.clone()), Some(d.span.line), Some(d.span.column)),
        None => (None, None, None),
    }
}

/// Parse `source` with a non-strict handler, recovering through every
/// syntax error it finds. `Handler::emit` only returns `Err` when strict, so
/// this never actually takes the error branches in non-strict mode; callers
/// read `handler.has_errors()` to learn whether anything went wrong.
fn parse_recovering(source: &str, handler: &mut Handler) -> Program {
    match Parser::new(source, handler) {
        Ok(mut parser) => parser.parse().unwrap_or(Program { declarations: Vec::new() }),
        Err(_) => Program { declarations: Vec::new() },
    }
}

pub fn check_syntax(source: &str) -> SyntaxCheck {
    let mut handler = Handler::new();
    parse_recovering(source, &mut handler);
    let (error, line, column) = diagnostic_parts(handler.first());
    SyntaxCheck {
        is_syntax_correct: !handler.has_errors(),
        error,
        line,
        column,
    }
}

pub fn check_typing(source: &str) -> TypingCheck {
    let mut parse_handler = Handler::new();
    let program = parse_recovering(source, &mut parse_handler);

    let mut sem_handler = Handler::new();
    let mut checker = TypeChecker::new(&mut sem_handler, source);
    let valid = checker.check(&program).unwrap_or(false);

    let (error, line, column) = diagnostic_parts(sem_handler.first());
    TypingCheck { valid, error, line, column }
}

/// Parse, type-check, and (only if both pass) generate MIPS assembly and
/// write it to `out_path`. In strict mode the first diagnostic from any
/// stage is returned as an `Err` instead of being folded into the report.
pub fn compile(source: &str, out_path: &Path, strict: bool) -> Result<CompileReport, DriverError> {
    let mut parse_handler = if strict { Handler::strict() } else { Handler::new() };
    let program = if strict {
        let mut parser = Parser::new(source, &mut parse_handler).map_err(DriverError::Diagnostic)?;
        parser.parse().map_err(DriverError::Diagnostic)?
    } else {
        parse_recovering(source, &mut parse_handler)
    };
    let is_syntax_valid = !parse_handler.has_errors();

    let mut sem_handler = if strict { Handler::strict() } else { Handler::new() };
    let mut checker = TypeChecker::new(&mut sem_handler, source);
    let is_typing_valid = if strict {
        checker.check(&program).map_err(DriverError::Diagnostic)?
    } else {
        checker.check(&program).unwrap_or(false)
    };

    if !is_syntax_valid || !is_typing_valid {
        let diagnostic = parse_handler
            .first()
            .or_else(|| sem_handler.first())
            .map(|d| d.render(source));
        return Ok(CompileReport {
            is_syntax_valid,
            is_typing_valid,
            diagnostic,
            asm: None,
        });
    }

    let mut generator = CodeGenerator::new();
    let asm = generator.generate(&program)?;
    std::fs::write(out_path, &asm).map_err(|e| DriverError::WriteOutput(out_path.to_path_buf(), e))?;

    Ok(CompileReport {
        is_syntax_valid: true,
        is_typing_valid: true,
        diagnostic: None,
        asm: Some(asm),
    })
}

/// Run only the lexer over `source` and render one line per token, for
/// `mcc --emit-tokens`.
pub fn emit_tokens(source: &str) -> String {
    let mut handler = Handler::new();
    let lexer = mcc_lex::Lexer::new(source, &mut handler);
    let mut out = String::new();
    for result in lexer {
        match result {
            Ok(token) => {
                out.push_str(&format!(
                    "{:<4}:{:<4} {:<12} {:?}\n",
                    token.span.line, token.span.column, token.kind, token.lexeme
                ));
            }
            Err(_) => break,
        }
    }
    out
}

/// Run the lexer and parser over `source` and render an s-expression view
/// of the resulting AST, for `mcc --emit-ast`. Uses whatever the parser
/// recovered, even if `source` has syntax errors.
pub fn emit_ast(source: &str) -> String {
    let mut handler = Handler::new();
    let program = parse_recovering(source, &mut handler);
    let mut out = String::new();
    sexpr::write_program(&mut out, &program);
    out
}

mod sexpr {
    use mcc_par::{CompoundStmt, Declaration, Expr, FunDeclaration, Program, Stmt, VarDeclaration};
    use std::fmt::Write as _;

    pub(super) fn write_program(out: &mut String, program: &Program) {
        let _ = writeln!(out, "(program");
        for decl in &program.declarations {
            write_decl(out, decl, 1);
        }
        let _ = writeln!(out, ")");
    }

    fn indent(out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
    }

    fn write_decl(out: &mut String, decl: &Declaration, depth: usize) {
        match decl {
            Declaration::Var(v) => write_var_decl(out, v, depth),
            Declaration::Fun(f) => write_fun_decl(out, f, depth),
        }
    }

    fn write_var_decl(out: &mut String, v: &VarDeclaration, depth: usize) {
        indent(out, depth);
        match v.array_size {
            Some(n) => {
                let _ = writeln!(out, "(var {} [{}])", v.name, n);
            }
            None => {
                let _ = writeln!(out, "(var {})", v.name);
            }
        }
    }

    fn write_fun_decl(out: &mut String, f: &FunDeclaration, depth: usize) {
        indent(out, depth);
        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| if p.is_array { format!("{}[]", p.name) } else { p.name.clone() })
            .collect();
        let _ = writeln!(out, "(fun {} ({}) {:?}", f.name, params.join(" "), f.return_type);
        write_compound(out, &f.body, depth + 1);
        indent(out, depth);
        let _ = writeln!(out, ")");
    }

    fn write_compound(out: &mut String, body: &CompoundStmt, depth: usize) {
        indent(out, depth);
        let _ = writeln!(out, "(block");
        for local in &body.locals {
            write_var_decl(out, local, depth + 1);
        }
        for stmt in &body.statements {
            write_stmt(out, stmt, depth + 1);
        }
        indent(out, depth);
        let _ = writeln!(out, ")");
    }

    fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
        match stmt {
            Stmt::Expr(e) => {
                indent(out, depth);
                let _ = writeln!(out, "{}", render_expr(e));
            }
            Stmt::Compound(c) => write_compound(out, c, depth),
            Stmt::Selection { condition, then_branch, else_branch, .. } => {
                indent(out, depth);
                let _ = writeln!(out, "(if {}", render_expr(condition));
                if let Some(then) = then_branch {
                    write_stmt(out, then, depth + 1);
                }
                if let Some(els) = else_branch {
                    indent(out, depth + 1);
                    let _ = writeln!(out, "(else");
                    write_stmt(out, els, depth + 2);
                    indent(out, depth + 1);
                    let _ = writeln!(out, ")");
                }
                indent(out, depth);
                let _ = writeln!(out, ")");
            }
            Stmt::Iteration { condition, body, .. } => {
                indent(out, depth);
                let _ = writeln!(out, "(while {}", render_expr(condition));
                if let Some(body) = body {
                    write_stmt(out, body, depth + 1);
                }
                indent(out, depth);
                let _ = writeln!(out, ")");
            }
            Stmt::Return { value, .. } => {
                indent(out, depth);
                match value {
                    Some(e) => {
                        let _ = writeln!(out, "(return {})", render_expr(e));
                    }
                    None => {
                        let _ = writeln!(out, "(return)");
                    }
                }
            }
        }
    }

    fn render_expr(expr: &Expr) -> String {
        match expr {
            Expr::Num { value, .. } => value.to_string(),
            Expr::Var { name, index: None, .. } => name.clone(),
            Expr::Var { name, index: Some(i), .. } => format!("({}[{}])", name, render_expr(i)),
            Expr::Assignment { target, value, .. } => {
                format!("(= {} {})", render_expr(target), render_expr(value))
            }
            Expr::Call { name, args, .. } => {
                let args: Vec<String> = args.iter().map(render_expr).collect();
                format!("({} {})", name, args.join(" "))
            }
            Expr::BinaryOp { op, lhs, rhs, .. } => {
                format!("({:?} {} {})", op, render_expr(lhs), render_expr(rhs))
            }
        }
    }
}

impl fmt::Display for SyntaxCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_syntax_correct {
            write!(f, "OK")
        } else {
            write!(f, "{}", self.error.as_deref().unwrap_or("syntax error"))
        }
    }
}

impl fmt::Display for TypingCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "OK")
        } else {
            write!(f, "{}", self.error.as_deref().unwrap_or("type error"))
        }
    }
}
