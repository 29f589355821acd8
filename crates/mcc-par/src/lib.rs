//! Recursive-descent parser for MiniC.
//!
//! The grammar is LL(1): every production is chosen by looking at the
//! current token alone. The parser composes a [`Lexer`] directly — it pulls
//! one token ahead, skipping any `Error` tokens the lexer already reported
//! (a lexical error and a missing/unexpected token are both "the source is
//! broken", and the parser doesn't need to see the former to keep parsing
//! past it).
//!
//! Recovery mirrors the lexer's: a failed [`Parser::expect`] records a
//! diagnostic and, unless the caller says to ignore the mismatch, skips
//! tokens until it finds the one it wanted (or end of file). This lets one
//! bad declaration or statement get reported without aborting the parse of
//! everything after it — in strict mode the first mismatch aborts instead.

use mcc_lex::{Lexer, Token, TokenKind};
use mcc_util::{Diagnostic, Handler, Span};

/// MiniC has exactly two declarable types at the source level; arrays are a
/// shape a variable or parameter can have, not a third first-class type a
/// user writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Void,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinOp {
    fn from_relop(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Leth => BinOp::Lt,
            TokenKind::Letheq => BinOp::Le,
            TokenKind::Bith => BinOp::Gt,
            TokenKind::Bitheq => BinOp::Ge,
            TokenKind::Eq => BinOp::Eq,
            TokenKind::Neq => BinOp::Ne,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Declaration {
    Var(VarDeclaration),
    Fun(FunDeclaration),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDeclaration {
    pub name: String,
    /// `Some(n)` for `int name[n];`, `None` for a plain scalar.
    pub array_size: Option<u32>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunDeclaration {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub body: CompoundStmt,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub is_array: bool,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompoundStmt {
    pub locals: Vec<VarDeclaration>,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Compound(CompoundStmt),
    Selection {
        condition: Expr,
        then_branch: Option<Box<Stmt>>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    Iteration {
        condition: Expr,
        body: Option<Box<Stmt>>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num {
        value: i64,
        span: Span,
    },
    Var {
        name: String,
        index: Option<Box<Expr>>,
        span: Span,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    BinaryOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Num { span, .. }
            | Expr::Var { span, .. }
            | Expr::Assignment { span, .. }
            | Expr::Call { span, .. }
            | Expr::BinaryOp { span, .. } => *span,
        }
    }
}

fn is_statement_starter(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Semicolon
            | TokenKind::Id
            | TokenKind::Lpar
            | TokenKind::Num
            | TokenKind::Lkey
            | TokenKind::If
            | TokenKind::While
            | TokenKind::Return
    )
}

fn is_expression_stmt_starter(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Semicolon | TokenKind::Id | TokenKind::Lpar | TokenKind::Num
    )
}

fn is_expression_starter(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Id | TokenKind::Lpar | TokenKind::Num)
}

/// Recursive-descent parser producing a [`Program`] from MiniC source text.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    current: Token,
    syntax_ok: bool,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str, handler: &'source mut Handler) -> Result<Self, String> {
        let mut lexer = Lexer::new(source, handler);
        let current = Self::first_non_error(&mut lexer)?;
        Ok(Self {
            lexer,
            current,
            syntax_ok: true,
        })
    }

    fn first_non_error(lexer: &mut Lexer<'source>) -> Result<Token, String> {
        let mut token = lexer.next_token()?;
        while token.kind == TokenKind::Error {
            token = lexer.next_token()?;
        }
        Ok(token)
    }

    /// Whether every `expect` so far has matched without falling back to
    /// error recovery.
    pub fn is_syntax_ok(&self) -> bool {
        self.syntax_ok
    }

    fn bump(&mut self) -> Result<(), String> {
        self.current = Self::first_non_error(&mut self.lexer)?;
        Ok(())
    }

    fn report(&mut self, message: impl Into<String>, span: Span) -> Result<(), String> {
        self.syntax_ok = false;
        let source = self.lexer.source().to_string();
        self.lexer.handler_mut().emit(Diagnostic::syntax(message, span), &source)
    }

    /// Consume the current token if it matches `expected`, returning its
    /// lexeme. On a mismatch, report a diagnostic; unless `ignore_error` is
    /// set, skip tokens until `expected` (or end of file) is found so the
    /// caller can keep parsing from a known-good point.
    fn expect(
        &mut self,
        expected: TokenKind,
        message: &str,
        ignore_error: bool,
    ) -> Result<String, String> {
        let lexeme = self.current.lexeme.clone();
        if self.current.kind == expected {
            self.bump()?;
            return Ok(lexeme);
        }

        let span = self.current.span;
        self.report(message, span)?;

        if ignore_error {
            return Ok(lexeme);
        }

        while self.current.kind != TokenKind::Endfile && self.current.kind != expected {
            self.bump()?;
        }
        let recovered_lexeme = self.current.lexeme.clone();
        if self.current.kind != TokenKind::Endfile {
            self.bump()?;
        }
        Ok(recovered_lexeme)
    }

    pub fn parse(&mut self) -> Result<Program, String> {
        let program = self.parse_program()?;
        if self.current.kind != TokenKind::Endfile {
            let span = self.current.span;
            self.report("program finished prematurely", span)?;
        }
        Ok(program)
    }

    fn parse_program(&mut self) -> Result<Program, String> {
        let mut declarations = vec![self.parse_declaration()?];
        while matches!(self.current.kind, TokenKind::Int | TokenKind::Void) {
            declarations.push(self.parse_declaration()?);
        }
        Ok(Program { declarations })
    }

    fn parse_declaration(&mut self) -> Result<Declaration, String> {
        if self.current.kind == TokenKind::Int {
            self.expect(TokenKind::Int, "", false)?;
            let name = self.expect(TokenKind::Id, "expected an identifier after 'int'", false)?;
            if self.current.kind == TokenKind::Lpar {
                self.expect(TokenKind::Lpar, "", false)?;
                Ok(Declaration::Fun(self.parse_fun_declaration(name, Type::Int)?))
            } else {
                Ok(Declaration::Var(self.parse_var_declaration(name)?))
            }
        } else {
            self.expect(TokenKind::Void, "expected 'int' or 'void' to start a declaration", false)?;
            let name = self.expect(TokenKind::Id, "expected an identifier after 'void'", false)?;
            self.expect(TokenKind::Lpar, "expected '(' for a function declaration", true)?;
            Ok(Declaration::Fun(self.parse_fun_declaration(name, Type::Void)?))
        }
    }

    fn parse_var_declaration(&mut self, name: String) -> Result<VarDeclaration, String> {
        let span = self.current.span;
        let mut array_size = None;
        if self.current.kind == TokenKind::Lbra {
            self.expect(TokenKind::Lbra, "", false)?;
            let num = self.expect(TokenKind::Num, "expected a number to define the array size", false)?;
            array_size = Some(num.parse::<u32>().unwrap_or(0));
            self.expect(TokenKind::Rbra, "expected ']' in an array size declaration", true)?;
        }
        self.expect(TokenKind::Semicolon, "expected ';' after a variable declaration", true)?;
        Ok(VarDeclaration { name, array_size, span })
    }

    fn parse_fun_declaration(&mut self, name: String, return_type: Type) -> Result<FunDeclaration, String> {
        let span = self.current.span;
        let params = self.parse_params()?;
        self.expect(TokenKind::Rpar, "expected ')' after the parameter list", true)?;
        let body = self.parse_compound_stmt()?;
        Ok(FunDeclaration { name, return_type, params, body, span })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, String> {
        if self.current.kind == TokenKind::Void {
            self.expect(TokenKind::Void, "", false)?;
            return Ok(Vec::new());
        }
        let mut params = vec![self.parse_param()?];
        while self.current.kind == TokenKind::Comma {
            self.expect(TokenKind::Comma, "", false)?;
            params.push(self.parse_param()?);
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param, String> {
        let span = self.current.span;
        self.expect(TokenKind::Int, "expected type 'int' for a parameter", false)?;
        let name = self.expect(TokenKind::Id, "expected an identifier for the parameter name", false)?;
        let mut is_array = false;
        if self.current.kind == TokenKind::Lbra {
            self.expect(TokenKind::Lbra, "", false)?;
            self.expect(TokenKind::Rbra, "expected ']' in an array parameter declaration", true)?;
            is_array = true;
        }
        Ok(Param { name, is_array, span })
    }

    fn parse_compound_stmt(&mut self) -> Result<CompoundStmt, String> {
        let span = self.current.span;
        self.expect(TokenKind::Lkey, "expected '{' to start a block", true)?;

        let mut locals = Vec::new();
        while self.current.kind == TokenKind::Int {
            self.expect(TokenKind::Int, "", false)?;
            let name = self.expect(TokenKind::Id, "expected an identifier in a variable declaration", false)?;
            locals.push(self.parse_var_declaration(name)?);
        }

        let mut statements = Vec::new();
        while is_statement_starter(self.current.kind) {
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
        }

        self.expect(TokenKind::Rkey, "expected '}' to close a block", true)?;
        Ok(CompoundStmt { locals, statements, span })
    }

    /// Returns `None` for a bare `;`, which is a legal statement that
    /// contributes no node to the tree.
    fn parse_statement(&mut self) -> Result<Option<Stmt>, String> {
        if is_expression_stmt_starter(self.current.kind) {
            if self.current.kind == TokenKind::Semicolon {
                self.expect(TokenKind::Semicolon, "", false)?;
                return Ok(None);
            }
            return Ok(Some(Stmt::Expr(self.parse_expression_stmt()?)));
        }
        let stmt = match self.current.kind {
            TokenKind::Lkey => Stmt::Compound(self.parse_compound_stmt()?),
            TokenKind::If => self.parse_selection_stmt()?,
            TokenKind::While => self.parse_iteration_stmt()?,
            _ => self.parse_return_stmt()?,
        };
        Ok(Some(stmt))
    }

    fn parse_expression_stmt(&mut self) -> Result<Expr, String> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after an expression", true)?;
        Ok(expr)
    }

    fn parse_selection_stmt(&mut self) -> Result<Stmt, String> {
        let span = self.current.span;
        self.expect(TokenKind::If, "", false)?;
        self.expect(TokenKind::Lpar, "expected '(' to start an if condition", true)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Rpar, "expected ')' to close an if condition", true)?;
        let then_branch = self.parse_statement()?.map(Box::new);
        let mut else_branch = None;
        if self.current.kind == TokenKind::Else {
            self.expect(TokenKind::Else, "", false)?;
            else_branch = self.parse_statement()?.map(Box::new);
        }
        Ok(Stmt::Selection { condition, then_branch, else_branch, span })
    }

    fn parse_iteration_stmt(&mut self) -> Result<Stmt, String> {
        let span = self.current.span;
        self.expect(TokenKind::While, "", false)?;
        self.expect(TokenKind::Lpar, "expected '(' to start a loop condition", true)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Rpar, "expected ')' after a loop condition", true)?;
        let body = self.parse_statement()?.map(Box::new);
        Ok(Stmt::Iteration { condition, body, span })
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, String> {
        let span = self.current.span;
        self.expect(TokenKind::Return, "", false)?;
        let value = if is_expression_starter(self.current.kind) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "expected ';' to end a return statement", true)?;
        Ok(Stmt::Return { value, span })
    }

    fn parse_expression(&mut self) -> Result<Expr, String> {
        if self.current.kind == TokenKind::Id {
            let span = self.current.span;
            let name = self.expect(TokenKind::Id, "", false)?;
            self.parse_id_expression(name, span)
        } else {
            self.parse_simple_expression(None)
        }
    }

    fn parse_id_expression(&mut self, name: String, span: Span) -> Result<Expr, String> {
        if self.current.kind == TokenKind::Lpar {
            self.expect(TokenKind::Lpar, "", false)?;
            let args = self.parse_args()?;
            self.expect(TokenKind::Rpar, "expected ')' to close a function call", true)?;
            return Ok(Expr::Call { name, args, span });
        }

        let mut index = None;
        if self.current.kind == TokenKind::Lbra {
            self.expect(TokenKind::Lbra, "", false)?;
            let idx = self.parse_expression()?;
            self.expect(TokenKind::Rbra, "expected ']' after indexing a variable", true)?;
            index = Some(Box::new(idx));
        }
        let var = Expr::Var { name, index, span };
        self.parse_id_simple_expression(var)
    }

    fn parse_id_simple_expression(&mut self, var: Expr) -> Result<Expr, String> {
        if self.current.kind == TokenKind::Assign {
            let span = self.current.span;
            self.expect(TokenKind::Assign, "", false)?;
            let value = self.parse_expression()?;
            return Ok(Expr::Assignment { target: Box::new(var), value: Box::new(value), span });
        }
        self.parse_simple_expression(Some(var))
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, String> {
        if !is_expression_starter(self.current.kind) {
            return Ok(Vec::new());
        }
        let mut args = vec![self.parse_expression()?];
        while self.current.kind == TokenKind::Comma {
            self.expect(TokenKind::Comma, "", false)?;
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    /// A relational operator binds at most once: `a < b < c` is not a
    /// chained comparison, it is a syntax error (the leftover `< c` cannot
    /// start whatever follows the expression).
    fn parse_simple_expression(&mut self, seed: Option<Expr>) -> Result<Expr, String> {
        let first = self.parse_additive_expression(seed)?;
        if let Some(op) = BinOp::from_relop(self.current.kind) {
            let span = self.current.span;
            self.bump()?;
            let second = self.parse_additive_expression(None)?;
            return Ok(Expr::BinaryOp { op, lhs: Box::new(first), rhs: Box::new(second), span });
        }
        Ok(first)
    }

    fn parse_additive_expression(&mut self, seed: Option<Expr>) -> Result<Expr, String> {
        let mut curr = self.parse_term(seed)?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = self.current.span;
            self.bump()?;
            let rhs = self.parse_term(None)?;
            curr = Expr::BinaryOp { op, lhs: Box::new(curr), rhs: Box::new(rhs), span };
        }
        Ok(curr)
    }

    fn parse_term(&mut self, seed: Option<Expr>) -> Result<Expr, String> {
        let mut curr = self.parse_factor(seed)?;
        loop {
            let op = match self.current.kind {
                TokenKind::Times => BinOp::Mul,
                TokenKind::Over => BinOp::Div,
                _ => break,
            };
            let span = self.current.span;
            self.bump()?;
            let rhs = self.parse_factor(None)?;
            curr = Expr::BinaryOp { op, lhs: Box::new(curr), rhs: Box::new(rhs), span };
        }
        Ok(curr)
    }

    fn parse_factor(&mut self, seed: Option<Expr>) -> Result<Expr, String> {
        if let Some(expr) = seed {
            return Ok(expr);
        }
        if self.current.kind == TokenKind::Lpar {
            self.expect(TokenKind::Lpar, "", false)?;
            let expr = self.parse_expression()?;
            self.expect(TokenKind::Rpar, "missing ')' to match an opening parenthesis", true)?;
            return Ok(expr);
        }
        if self.current.kind == TokenKind::Num {
            let span = self.current.span;
            let lexeme = self.expect(TokenKind::Num, "", false)?;
            let value = lexeme.parse::<i64>().unwrap_or(0);
            return Ok(Expr::Num { value, span });
        }

        let span = self.current.span;
        let name = self.expect(TokenKind::Id, "unexpected token in an expression, expected an identifier", false)?;
        if self.current.kind == TokenKind::Lpar {
            self.expect(TokenKind::Lpar, "", false)?;
            let args = self.parse_args()?;
            self.expect(TokenKind::Rpar, "expected ')' to close a function call", true)?;
            return Ok(Expr::Call { name, args, span });
        }
        let mut index = None;
        if self.current.kind == TokenKind::Lbra {
            self.expect(TokenKind::Lbra, "", false)?;
            let idx = self.parse_expression()?;
            self.expect(TokenKind::Rbra, "expected ']' after indexing a variable", true)?;
            index = Some(Box::new(idx));
        }
        Ok(Expr::Var { name, index, span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (Program, bool, Handler) {
        let mut handler = Handler::new();
        let program = {
            let mut parser = Parser::new(source, &mut handler).unwrap();
            let program = parser.parse().unwrap();
            assert!(parser.is_syntax_ok() || handler.has_errors());
            program
        };
        let ok = !handler.has_errors();
        (program, ok, handler)
    }

    #[test]
    fn parses_a_scalar_and_array_declaration() {
        let (program, ok, _) = parse("int x; int arr[10];");
        assert!(ok);
        assert_eq!(program.declarations.len(), 2);
        match &program.declarations[0] {
            Declaration::Var(v) => {
                assert_eq!(v.name, "x");
                assert_eq!(v.array_size, None);
            }
            _ => panic!("expected a var declaration"),
        }
        match &program.declarations[1] {
            Declaration::Var(v) => {
                assert_eq!(v.name, "arr");
                assert_eq!(v.array_size, Some(10));
            }
            _ => panic!("expected a var declaration"),
        }
    }

    #[test]
    fn parses_a_void_function_with_params() {
        let (program, ok, _) = parse("void f(int a, int b[]) { return; }");
        assert!(ok);
        match &program.declarations[0] {
            Declaration::Fun(f) => {
                assert_eq!(f.name, "f");
                assert_eq!(f.return_type, Type::Void);
                assert_eq!(f.params.len(), 2);
                assert!(!f.params[0].is_array);
                assert!(f.params[1].is_array);
            }
            _ => panic!("expected a function declaration"),
        }
    }

    #[test]
    fn parses_an_int_function_with_no_params() {
        let (program, ok, _) = parse("int f(void) { return 0; }");
        assert!(ok);
        match &program.declarations[0] {
            Declaration::Fun(f) => {
                assert_eq!(f.return_type, Type::Int);
                assert!(f.params.is_empty());
            }
            _ => panic!("expected a function declaration"),
        }
    }

    #[test]
    fn parses_if_else_and_while() {
        let (program, ok, _) = parse(
            "void main(void) { if (x < 1) x = 1; else x = 2; while (x) x = x - 1; }",
        );
        assert!(ok);
        let Declaration::Fun(main_fn) = &program.declarations[0] else {
            panic!("expected a function declaration")
        };
        assert_eq!(main_fn.body.statements.len(), 2);
        assert!(matches!(main_fn.body.statements[0], Stmt::Selection { .. }));
        assert!(matches!(main_fn.body.statements[1], Stmt::Iteration { .. }));
    }

    #[test]
    fn expression_precedence_is_times_over_plus() {
        let (program, ok, _) = parse("void main(void) { x = 1 + 2 * 3; }");
        assert!(ok);
        let Declaration::Fun(main_fn) = &program.declarations[0] else {
            panic!("expected a function declaration")
        };
        let Stmt::Expr(Expr::Assignment { value, .. }) = &main_fn.body.statements[0] else {
            panic!("expected an assignment statement")
        };
        match value.as_ref() {
            Expr::BinaryOp { op: BinOp::Add, rhs, .. } => {
                assert!(matches!(rhs.as_ref(), Expr::BinaryOp { op: BinOp::Mul, .. }));
            }
            other => panic!("expected a top-level addition, got {other:?}"),
        }
    }

    #[test]
    fn function_calls_and_indexing_parse() {
        let (program, ok, _) = parse("void main(void) { x = arr[i]; y = f(1, 2); }");
        assert!(ok);
        let Declaration::Fun(main_fn) = &program.declarations[0] else {
            panic!("expected a function declaration")
        };
        let Stmt::Expr(Expr::Assignment { value, .. }) = &main_fn.body.statements[0] else {
            panic!("expected an assignment")
        };
        assert!(matches!(value.as_ref(), Expr::Var { index: Some(_), .. }));
        let Stmt::Expr(Expr::Assignment { value, .. }) = &main_fn.body.statements[1] else {
            panic!("expected an assignment")
        };
        match value.as_ref() {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "f");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a call, got {other:?}"),
        }
    }

    #[test]
    fn chained_relational_operators_are_a_syntax_error() {
        let (_program, ok, handler) = parse("void main(void) { x = a < b < c; }");
        assert!(!ok);
        assert!(handler.has_errors());
    }

    #[test]
    fn missing_semicolon_is_recovered_non_strict() {
        let (program, ok, handler) = parse("void main(void) { int x; x = 1 x = 2; }");
        assert!(!ok);
        assert!(handler.has_errors());
        // Recovery resumes parsing: the function body is still present.
        assert_eq!(program.declarations.len(), 1);
    }

    #[test]
    fn strict_mode_aborts_on_first_syntax_error() {
        let mut handler = Handler::strict();
        let result = Parser::new("void main(void) { x = ; }", &mut handler).and_then(|mut p| p.parse());
        assert!(result.is_err());
    }

    fn ident_strategy() -> impl proptest::strategy::Strategy<Value = String> {
        use proptest::strategy::Strategy;
        "[a-z]{1,6}".prop_filter("must not be a reserved word", |s| {
            !matches!(s.as_str(), "if" | "int" | "void" | "else" | "while" | "return")
        })
    }

    proptest::proptest! {
        #[test]
        fn never_panics_on_arbitrary_ascii_source(source in "[ -~\\n\\t]{0,120}") {
            let mut handler = Handler::new();
            if let Ok(mut parser) = Parser::new(&source, &mut handler) {
                let _ = parser.parse();
            }
        }

        #[test]
        fn any_number_of_scalar_declarations_parses_cleanly(names in proptest::collection::vec(ident_strategy(), 1..8)) {
            let source: String = names.iter().map(|n| format!("int {n};")).collect();
            let mut handler = Handler::new();
            let mut parser = Parser::new(&source, &mut handler).unwrap();
            let program = parser.parse().unwrap();
            prop_assert!(!handler.has_errors());
            prop_assert_eq!(program.declarations.len(), names.len());
        }
    }

    #[test]
    fn empty_return_and_value_return_both_parse() {
        let (program, ok, _) = parse("int f(void) { return; } int g(void) { return 1 + 2; }");
        assert!(ok);
        let Declaration::Fun(f) = &program.declarations[0] else { panic!() };
        assert!(matches!(&f.body.statements[0], Stmt::Return { value: None, .. }));
        let Declaration::Fun(g) = &program.declarations[1] else { panic!() };
        assert!(matches!(&g.body.statements[0], Stmt::Return { value: Some(_), .. }));
    }
}
