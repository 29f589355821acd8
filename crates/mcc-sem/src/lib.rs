//! Scope resolution and type checking for MiniC.
//!
//! A program is checked with a single top-down traversal that, at every
//! scope-introducing node (the program itself, a function body, a nested
//! block), fills one [`SymbolTable`] scope before descending into it and
//! pops it on the way back out — the same shape as a textbook symbol-table
//! walk over an already-parsed tree. A function's parameters and its
//! top-level local variables share one scope (the function doesn't get a
//! second, separate scope for its own body); a `{ ... }` block nested
//! inside a statement gets its own scope the way a C block does.
//!
//! Unlike the lexer and parser, a semantic error always stops the walk: the
//! first ill-typed construct is reported and checking returns, so there is
//! at most one semantic diagnostic per compilation. This mirrors how a
//! single undeclared identifier can make every later type judgement
//! meaningless (an expression built on a name that doesn't exist has no
//! type to report mismatches against).

use indexmap::IndexMap;
use mcc_par::{CompoundStmt, Declaration, Expr, FunDeclaration, Program, Stmt, Type as SourceType, VarDeclaration};
use mcc_util::{Diagnostic, Handler, Span};

/// The type of a declared symbol or a checked expression. Distinct from
/// [`mcc_par::Type`], which only has the two types a user can write in a
/// declaration — `Array` only ever shows up here, derived from a
/// declaration's array size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Void,
    Array,
}

impl Type {
    fn name(self) -> &'static str {
        match self {
            Type::Int => "Int",
            Type::Void => "Void",
            Type::Array => "Array",
        }
    }
}

impl From<SourceType> for Type {
    fn from(ty: SourceType) -> Self {
        match ty {
            SourceType::Int => Type::Int,
            SourceType::Void => Type::Void,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One declared name: a variable, a parameter, or a function.
///
/// `pos` is the symbol's 1-based position within its scope, used later by
/// the code generator to compute its byte offset in the activation record
/// (`scope_offset` et al. below compute the offset of a whole scope; `pos`
/// within that scope still has to be multiplied out by the generator, which
/// knows the per-symbol slot size).
#[derive(Clone, Debug)]
pub struct Symbol {
    pub ty: Type,
    pub name: String,
    pub pos: u32,
    pub array_size: u32,
    pub is_function: bool,
    pub param_types: Vec<Type>,
    /// Array sizes (0 for a scalar) of this function's top-level locals, in
    /// declaration order — the generator needs these to size the
    /// activation record without re-walking the function body.
    pub body_array_sizes: Vec<u32>,
    pub is_global: bool,
}

type Scope = IndexMap<String, Symbol>;

/// A stack of scopes, innermost last, searched back-to-front so an inner
/// declaration shadows an outer one of the same name.
#[derive(Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn param_type(is_array: bool) -> Type {
        if is_array {
            Type::Array
        } else {
            Type::Int
        }
    }

    fn var_type(array_size: u32) -> Type {
        if array_size == 0 {
            Type::Int
        } else {
            Type::Array
        }
    }

    /// Push the global scope: every top-level variable and function.
    /// Fills the global scope, rejecting a second top-level declaration of
    /// a name already bound (to a function or a variable) by returning the
    /// duplicate name and the span of the offending redeclaration — the
    /// scope still ends up pushed with every earlier declaration in it, so
    /// the caller can keep walking the rest of the program after reporting
    /// the error.
    pub fn enter_program_scope(&mut self, program: &Program) -> Result<(), (String, Span)> {
        let mut scope = Scope::new();
        let mut pos = 1;
        let mut duplicate = None;
        for decl in &program.declarations {
            let (name, span, symbol) = match decl {
                Declaration::Var(v) => (v.name.clone(), v.span, Self::var_symbol(v, pos, true)),
                Declaration::Fun(f) => (f.name.clone(), f.span, Self::fun_symbol(f, pos, true)),
            };
            if scope.contains_key(&name) {
                duplicate.get_or_insert((name, span));
                continue;
            }
            scope.insert(name, symbol);
            pos += 1;
        }
        self.scopes.push(scope);
        match duplicate {
            Some(d) => Err(d),
            None => Ok(()),
        }
    }

    /// Push one scope holding a function's parameters followed by its
    /// top-level locals — these are one combined scope, not two nested
    /// ones.
    pub fn enter_function_scope(&mut self, fun: &FunDeclaration) {
        let is_global = self.scopes.is_empty();
        let mut scope = Scope::new();
        let mut pos = 1;
        for param in &fun.params {
            scope.insert(
                param.name.clone(),
                Symbol {
                    ty: Self::param_type(param.is_array),
                    name: param.name.clone(),
                    pos,
                    array_size: 0,
                    is_function: false,
                    param_types: Vec::new(),
                    body_array_sizes: Vec::new(),
                    is_global,
                },
            );
            pos += 1;
        }
        for local in &fun.body.locals {
            scope.insert(local.name.clone(), Self::var_symbol(local, pos, is_global));
            pos += 1;
        }
        self.scopes.push(scope);
    }

    /// Push one scope for a nested `{ ... }` block's own locals, or for any
    /// other single-statement body a control-flow branch can have (with an
    /// empty local slice) — a branch with no braces still gets an
    /// activation-record-shaped scope so stack teardown stays uniform.
    pub fn enter_block_scope(&mut self, locals: &[VarDeclaration]) {
        let is_global = self.scopes.is_empty();
        let mut scope = Scope::new();
        let mut pos = 1;
        for local in locals {
            scope.insert(local.name.clone(), Self::var_symbol(local, pos, is_global));
            pos += 1;
        }
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn var_symbol(v: &VarDeclaration, pos: u32, is_global: bool) -> Symbol {
        let array_size = v.array_size.unwrap_or(0);
        Symbol {
            ty: Self::var_type(array_size),
            name: v.name.clone(),
            pos,
            array_size,
            is_function: false,
            param_types: Vec::new(),
            body_array_sizes: Vec::new(),
            is_global,
        }
    }

    fn fun_symbol(f: &FunDeclaration, pos: u32, is_global: bool) -> Symbol {
        let param_types = f.params.iter().map(|p| Self::param_type(p.is_array)).collect();
        let body_array_sizes = f.body.locals.iter().map(|v| v.array_size.unwrap_or(0)).collect();
        Symbol {
            ty: f.return_type.into(),
            name: f.name.clone(),
            pos,
            array_size: 0,
            is_function: true,
            param_types,
            body_array_sizes,
            is_global,
        }
    }

    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn get_type(&self, name: &str) -> Option<Type> {
        self.get_symbol(name).map(|s| s.ty)
    }

    pub fn get_fun_param_types(&self, name: &str) -> Option<&[Type]> {
        self.scopes.first()?.get(name).map(|s| s.param_types.as_slice())
    }

    /// Array sizes (0 for scalars) of the named function's top-level
    /// locals, in declaration order — the code generator pre-allocates
    /// these on the stack (heap-allocating the array ones) at every call
    /// site, before evaluating arguments.
    pub fn get_fun_body_array_sizes(&self, name: &str) -> Option<&[u32]> {
        self.scopes.first()?.get(name).map(|s| s.body_array_sizes.as_slice())
    }

    pub fn global_symbols(&self) -> (Vec<&Symbol>, Vec<&Symbol>) {
        let mut variables = Vec::new();
        let mut functions = Vec::new();
        if let Some(global) = self.scopes.first() {
            for symbol in global.values() {
                if symbol.is_function {
                    functions.push(symbol);
                } else {
                    variables.push(symbol);
                }
            }
        }
        (variables, functions)
    }

    /// The innermost scope's symbols, in declaration order — the generator
    /// walks these to lay out a function's activation record.
    pub fn current_scope(&self) -> impl Iterator<Item = &Symbol> {
        self.scopes.last().into_iter().flat_map(|scope| scope.values())
    }

    /// Byte offset, from the current activation record's base, of the
    /// scope that declares `name` — the sum of `(len(scope) + 2) * 4` for
    /// every scope searched before the one that holds it (the `+2` accounts
    /// for the saved frame pointer and return address slots every
    /// activation record reserves).
    pub fn scope_offset(&self, name: &str) -> i32 {
        let mut offset = 0;
        for scope in self.scopes.iter().rev() {
            if scope.contains_key(name) {
                break;
            }
            offset += (scope.len() as i32 + 2) * 4;
        }
        offset
    }

    /// Byte offset to the activation record of the function enclosing the
    /// current (possibly nested-block) scope, skipping the outermost two
    /// entries (global scope and the running function's own top scope).
    pub fn control_statement_offset(&self) -> i32 {
        let mut offset = 0;
        for i in (0..self.scopes.len()).rev() {
            if i <= 1 {
                return offset;
            }
            offset += (self.scopes[i].len() as i32 + 2) * 4;
        }
        offset
    }
}

/// Walks a parsed [`Program`], filling scopes and checking every
/// expression's type against the rules in the module doc comment.
pub struct TypeChecker<'a> {
    symbols: SymbolTable,
    valid: bool,
    handler: &'a mut Handler,
    source: &'a str,
}

impl<'a> TypeChecker<'a> {
    pub fn new(handler: &'a mut Handler, source: &'a str) -> Self {
        Self {
            symbols: SymbolTable::new(),
            valid: true,
            handler,
            source,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Type-check `program`, returning whether it is well-typed. Stops at
    /// the first ill-typed construct.
    pub fn check(&mut self, program: &Program) -> Result<bool, String> {
        self.check_program(program)?;
        Ok(self.valid)
    }

    fn error(&mut self, message: impl Into<String>, span: Span) -> Result<(), String> {
        self.valid = false;
        self.handler.emit(Diagnostic::semantic(message, span), self.source)
    }

    fn check_program(&mut self, program: &Program) -> Result<(), String> {
        if let Err((name, span)) = self.symbols.enter_program_scope(program) {
            self.error(format!("redeclaration of {name} at global scope"), span)?;
        }
        for decl in &program.declarations {
            if !self.valid {
                break;
            }
            if let Declaration::Fun(fun) = decl {
                self.check_function(fun)?;
            }
        }
        self.symbols.pop_scope();
        Ok(())
    }

    fn check_function(&mut self, fun: &FunDeclaration) -> Result<(), String> {
        self.symbols.enter_function_scope(fun);
        for stmt in &fun.body.statements {
            if !self.valid {
                break;
            }
            self.check_stmt(stmt, &fun.name)?;
        }
        self.symbols.pop_scope();
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt, fun_name: &str) -> Result<(), String> {
        if !self.valid {
            return Ok(());
        }
        match stmt {
            Stmt::Expr(expr) => {
                self.check_expr(expr, fun_name)?;
            }
            Stmt::Compound(compound) => {
                self.symbols.enter_block_scope(&compound.locals);
                for s in &compound.statements {
                    if !self.valid {
                        break;
                    }
                    self.check_stmt(s, fun_name)?;
                }
                self.symbols.pop_scope();
            }
            Stmt::Selection { condition, then_branch, else_branch, .. } => {
                self.check_expr(condition, fun_name)?;
                if let Some(then_branch) = then_branch {
                    self.check_stmt(then_branch, fun_name)?;
                }
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch, fun_name)?;
                }
            }
            Stmt::Iteration { condition, body, .. } => {
                self.check_expr(condition, fun_name)?;
                if let Some(body) = body {
                    self.check_stmt(body, fun_name)?;
                }
            }
            Stmt::Return { value, span } => {
                let return_type = match value {
                    Some(expr) => self.check_expr(expr, fun_name)?,
                    None => Some(Type::Void),
                };
                let expected = self.symbols.get_type(fun_name);
                if return_type != expected {
                    let expected_name = expected.map(|t| t.name()).unwrap_or("Void");
                    let span = *span;
                    self.error(format!("return value of wrong type, expected {expected_name}"), span)?;
                }
            }
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr, fun_name: &str) -> Result<Option<Type>, String> {
        if !self.valid {
            return Ok(None);
        }
        match expr {
            Expr::Num { .. } => Ok(Some(Type::Int)),

            Expr::Var { name, index, span } => {
                let Some(id_type) = self.symbols.get_type(name) else {
                    self.error(format!("undeclared identifier: {name}"), *span)?;
                    return Ok(None);
                };
                match index {
                    None => Ok(Some(id_type)),
                    Some(index_expr) => {
                        let index_type = self.check_expr(index_expr, fun_name)?;
                        if id_type != Type::Array {
                            self.error(format!("cannot index non-array identifier: {name}"), *span)?;
                            return Ok(None);
                        }
                        if index_type != Some(Type::Int) {
                            self.error(format!("indexing value has to be Int in identifier: {name}"), *span)?;
                            return Ok(None);
                        }
                        Ok(Some(Type::Int))
                    }
                }
            }

            Expr::Call { name, args, span } => {
                let (call_type, param_types): (Option<Type>, Vec<Type>) = match name.as_str() {
                    "input" => (Some(Type::Int), Vec::new()),
                    "output" => (Some(Type::Void), vec![Type::Int]),
                    _ => (
                        self.symbols.get_type(name),
                        self.symbols.get_fun_param_types(name).map(|s| s.to_vec()).unwrap_or_default(),
                    ),
                };
                let Some(call_type) = call_type else {
                    self.error(format!("calling undeclared function: {name}"), *span)?;
                    return Ok(None);
                };
                if args.len() != param_types.len() {
                    self.error(format!("wrong number of parameters in function: {name}"), *span)?;
                    return Ok(Some(call_type));
                }
                for (i, arg) in args.iter().enumerate() {
                    let arg_type = self.check_expr(arg, fun_name)?;
                    let Some(arg_type) = arg_type else {
                        return Ok(Some(call_type));
                    };
                    if arg_type != param_types[i] {
                        let expected = param_types[i];
                        self.error(
                            format!("argument {} to function {name} is of the wrong type, expected {expected}", i + 1),
                            arg.span(),
                        )?;
                        return Ok(Some(call_type));
                    }
                }
                Ok(Some(call_type))
            }

            Expr::BinaryOp { lhs, rhs, span, .. } => {
                let lhs_type = self.check_expr(lhs, fun_name)?;
                let rhs_type = self.check_expr(rhs, fun_name)?;
                if !self.valid {
                    return Ok(Some(Type::Int));
                }
                if lhs_type != Some(Type::Int) {
                    let ty = lhs_type.map(|t| t.name()).unwrap_or("Void");
                    self.error(format!("Int type expected in operation, not {ty}"), lhs.span())?;
                } else if rhs_type != Some(Type::Int) {
                    let ty = rhs_type.map(|t| t.name()).unwrap_or("Void");
                    self.error(format!("Int type expected in operation, not {ty}"), rhs.span())?;
                }
                Ok(Some(Type::Int))
            }

            Expr::Assignment { target, value, .. } => {
                let left_type = self.check_expr(target, fun_name)?;
                let right_type = self.check_expr(value, fun_name)?;
                if !self.valid {
                    return Ok(right_type);
                }
                if left_type != right_type {
                    let left_name = left_type.map(|t| t.name()).unwrap_or("Void");
                    let right_name = right_type.map(|t| t.name()).unwrap_or("Void");
                    self.error(
                        format!("trying to assign {right_name} to {left_name} variable"),
                        value.span(),
                    )?;
                }
                Ok(right_type)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_par::Parser;

    fn check(source: &str) -> (bool, Handler) {
        let mut parse_handler = Handler::new();
        let mut parser = Parser::new(source, &mut parse_handler).unwrap();
        let program = parser.parse().unwrap();
        assert!(!parse_handler.has_errors(), "fixture should parse cleanly");

        let mut handler = Handler::new();
        let mut checker = TypeChecker::new(&mut handler, source);
        let ok = checker.check(&program).unwrap();
        (ok, handler)
    }

    #[test]
    fn well_typed_program_passes() {
        let (ok, handler) = check("void main(void) { int x; x = 5; output(x); }");
        assert!(ok);
        assert!(!handler.has_errors());
    }

    #[test]
    fn undeclared_identifier_fails() {
        let (ok, handler) = check("void main(void) { x = 1; }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("undeclared"));
    }

    #[test]
    fn indexing_a_scalar_is_an_error() {
        let (ok, handler) = check("void main(void) { int x; x[0] = 1; }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("non-array"));
    }

    #[test]
    fn indexing_with_a_non_int_is_an_error() {
        let (ok, _) = check("void main(void) { int arr[5]; int f(void) { return; } arr[f()] = 1; }");
        assert!(!ok);
    }

    #[test]
    fn calling_an_undeclared_function_fails() {
        let (ok, handler) = check("void main(void) { ghost(); }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("undeclared function"));
    }

    #[test]
    fn wrong_argument_count_fails() {
        let (ok, handler) = check("int f(int a) { return a; } void main(void) { f(1, 2); }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("wrong number of parameters"));
    }

    #[test]
    fn wrong_argument_type_fails() {
        let (ok, _) = check("int f(int a) { return a; } void main(void) { int arr[3]; f(arr); }");
        assert!(!ok);
    }

    #[test]
    fn wrong_return_type_fails() {
        let (ok, handler) = check("int f(void) { return; } void main(void) { }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("return value of wrong type"));
    }

    #[test]
    fn void_return_with_no_value_passes() {
        let (ok, _) = check("void f(void) { return; } void main(void) { f(); }");
        assert!(ok);
    }

    #[test]
    fn binary_op_on_void_is_an_error() {
        let (ok, handler) = check("void f(void) { return; } void main(void) { int x; x = f() + 1; }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("Int type expected"));
    }

    #[test]
    fn assigning_array_to_scalar_is_an_error() {
        let (ok, handler) = check("void main(void) { int x; int arr[3]; x = arr; }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("trying to assign"));
    }

    #[test]
    fn input_and_output_builtins_are_always_available() {
        let (ok, _) = check("void main(void) { int x; x = input(); output(x); }");
        assert!(ok);
    }

    #[test]
    fn nested_blocks_get_their_own_scope() {
        let (ok, _) = check(
            "void main(void) { int x; x = 1; { int x; x = 2; } output(x); }",
        );
        assert!(ok);
    }

    #[test]
    fn duplicate_main_is_rejected() {
        let (ok, handler) = check("int main(void) { return 1; } int main(void) { return 2; }");
        assert!(!ok);
        assert!(handler.all()[0].message.contains("redeclaration"));
    }

    #[test]
    fn recursive_function_calls_are_allowed() {
        let (ok, _) = check(
            "int fact(int n) { if (n < 2) return 1; return n * fact(n - 1); }\nvoid main(void) { output(fact(5)); }",
        );
        assert!(ok);
    }

    #[test]
    fn strict_mode_aborts_on_first_semantic_error() {
        let mut parse_handler = Handler::new();
        let mut parser = Parser::new("void main(void) { x = 1; }", &mut parse_handler).unwrap();
        let program = parser.parse().unwrap();

        let mut handler = Handler::strict();
        let mut checker = TypeChecker::new(&mut handler, "void main(void) { x = 1; }");
        let result = checker.check(&program);
        assert!(result.is_err());
    }

    #[test]
    fn scope_offset_accounts_for_saved_fp_and_ra() {
        let mut parse_handler = Handler::new();
        let mut parser = Parser::new(
            "int g; void main(void) { int x; x = g; }",
            &mut parse_handler,
        )
        .unwrap();
        let program = parser.parse().unwrap();
        let mut handler = Handler::new();
        let mut checker = TypeChecker::new(&mut handler, "");
        checker.check(&program).unwrap();
        // can't inspect mid-traversal scopes from outside; smoke test that
        // the table is empty once checking has returned to the top level.
        assert_eq!(checker.symbols().scope_offset("g"), 0);
    }
}
