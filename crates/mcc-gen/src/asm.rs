//! MIPS/SPIM assembly emission.
//!
//! Mirrors a stack machine: every expression is evaluated into `$a0`, and
//! any code that needs an operand to survive across a nested evaluation
//! pushes it to the stack first and pops it back into `$t1`. An activation
//! record is built by the *caller*: the old `$fp`, then each callee local
//! (heap-allocating arrays via `sbrk`), then each argument, all pushed
//! right-to-left/bottom-up; the callee itself only sets `$fp := $sp` and
//! saves `$ra`. This puts the frame layout entirely under the code
//! generator's control and keeps the callee prologue to two instructions.

use crate::error::{CodeGenError, Result};
use mcc_par::{BinOp, CompoundStmt, Declaration, Expr, FunDeclaration, Program, Stmt, VarDeclaration};
use mcc_sem::SymbolTable;

const WORD: u32 = 4;

/// A branch's own locals, or an empty slice when it has none (no branch at
/// all, or a branch that isn't a brace-delimited block).
fn branch_locals(stmt: Option<&Stmt>) -> &[VarDeclaration] {
    match stmt {
        Some(Stmt::Compound(c)) => &c.locals,
        _ => &[],
    }
}

pub struct CodeGenerator {
    symbols: SymbolTable,
    control_statement_count: u32,
    current_function_label: String,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            control_statement_count: 0,
            current_function_label: String::new(),
        }
    }

    /// Emit a full `.s` file for `program`, or an empty string if it
    /// declares no `main` function — a deliberate sentinel meaning "nothing
    /// to run", consumed by the driver rather than treated as an error.
    pub fn generate(&mut self, program: &Program) -> Result<String> {
        let _ = self.symbols.enter_program_scope(program);
        let (variables, functions) = self.symbols.global_symbols();

        if !functions.iter().any(|f| f.name == "main") {
            return Ok(String::new());
        }

        let mut data = String::from(".data\n\tnewline: .asciiz \"\\n\"\n\t.align 2\n");
        let mut heap_calls = String::new();
        for var in &variables {
            if var.array_size == 0 {
                data += &format!("\t{}: .word 0\n", var.name);
            } else {
                data += &format!("\t{}: .space {}\n", var.name, var.array_size * WORD);
                heap_calls += &format!(
                    "   li $v0 9\n   li $a0 {}\n   syscall\n   sw $v0, {}\n\n",
                    var.array_size * WORD,
                    var.name
                );
            }
        }

        let main_call = self.generate_caller_code("main", &[])?;
        let mut text = String::from(".text\n.globl main\nmain:\n");
        text += &heap_calls;
        text += &main_call;
        text += "\n   li $v0 10\n   syscall\n\n";

        for decl in &program.declarations {
            if let Declaration::Fun(fun) = decl {
                text += &self.generate_function(fun)?;
            }
        }

        Ok(data + &text)
    }

    fn generate_caller_code(&mut self, name: &str, args: &[Expr]) -> Result<String> {
        if name == "output" {
            let mut asm = self.generate_expr(&args[0])?;
            asm += "   li $v0, 1\n   syscall\n   la $a0, newline\n   li $v0 4\n   syscall\n";
            return Ok(asm);
        }
        if name == "input" {
            return Ok(String::from("   li $v0 5\n   syscall\n   move $a0 $v0\n"));
        }

        let body_sizes = self
            .symbols
            .get_fun_body_array_sizes(name)
            .ok_or_else(|| CodeGenError::UndefinedFunction(name.to_string()))?
            .to_vec();

        let mut asm = String::from("   sw $fp 0($sp)\n   addiu $sp $sp -4\n");
        for &size in body_sizes.iter().rev() {
            if size != 0 {
                asm += &format!("   li $v0 9\n   li $a0 {}\n   syscall\n   move $a0, $v0\n", size * WORD);
            }
            asm += "   sw $a0 0($sp)\n   addiu $sp $sp -4\n";
        }

        for arg in args.iter().rev() {
            asm += &self.generate_expr(arg)?;
            asm += "   sw $a0 0($sp)\n   addiu $sp $sp -4\n";
        }

        asm += &format!("   jal {name}_entry\n");
        Ok(asm)
    }

    fn generate_function(&mut self, fun: &FunDeclaration) -> Result<String> {
        self.symbols.enter_function_scope(fun);

        let mut asm = format!(
            "{}_entry:\n   move $fp $sp\n   sw $ra 0($sp)\n   addiu $sp $sp -4\n\n",
            fun.name
        );

        self.current_function_label = fun.name.clone();
        for stmt in &fun.body.statements {
            asm += &self.generate_stmt(stmt)?;
        }
        self.current_function_label.clear();

        let frame_size = WORD * self.symbols.current_scope().count() as u32 + 8;
        asm += &format!(
            "{}_exit:\n\n   lw $ra 4($sp)\n   addiu $sp $sp {}\n   lw $fp 0($sp)\n   jr $ra\n\n",
            fun.name, frame_size
        );

        self.symbols.pop_scope();
        Ok(asm)
    }

    fn generate_stmt(&mut self, stmt: &Stmt) -> Result<String> {
        match stmt {
            Stmt::Expr(expr) => self.generate_expr(expr),
            // The grammar allows a bare `{ ... }` anywhere a statement can
            // appear, but only an `if`/`while` branch gets a dedicated
            // stack frame here (via `lower_branch`); a standalone nested
            // block's own locals are never pushed onto the runtime stack,
            // matching the narrow case the original generator handles.
            Stmt::Compound(compound) => {
                let mut asm = String::new();
                for s in &compound.statements {
                    asm += &self.generate_stmt(s)?;
                }
                Ok(asm)
            }
            Stmt::Selection { condition, then_branch, else_branch, .. } => {
                self.generate_selection(condition, then_branch.as_deref(), else_branch.as_deref())
            }
            Stmt::Iteration { condition, body, .. } => self.generate_iteration(condition, body.as_deref()),
            Stmt::Return { value, .. } => {
                let mut asm = match value {
                    Some(expr) => self.generate_expr(expr)?,
                    None => String::new(),
                };
                asm += &format!("   b {}_exit\n", self.current_function_label);
                Ok(asm)
            }
        }
    }

    fn generate_selection(&mut self, condition: &Expr, then_branch: Option<&Stmt>, else_branch: Option<&Stmt>) -> Result<String> {
        let count = self.next_control_label();
        let mut asm = String::from("\n   # If Statement\n");
        asm += &self.generate_expr(condition)?;
        asm += &format!("   li $t1 0\n   beq $a0 $t1 false_branch_{count}\n\ntrue_branch_{count}:\n");
        if let Some(then_branch) = then_branch {
            asm += &self.lower_branch(then_branch)?;
        }
        asm += &format!("   b end_if_{count}\n\nfalse_branch_{count}:\n");
        if let Some(else_branch) = else_branch {
            asm += &self.lower_branch(else_branch)?;
        }
        asm += &format!("end_if_{count}:\n");
        Ok(asm)
    }

    /// The loop body's scope is allocated once before `while_entry` and torn
    /// down once after `while_exit` — not per iteration — matching the
    /// original generator's `_controlStatementVariableCode` call sitting
    /// outside the `while_entry`/`while_exit` pair rather than inside it.
    fn generate_iteration(&mut self, condition: &Expr, body: Option<&Stmt>) -> Result<String> {
        let count = self.next_control_label();
        let mut asm = String::from("\n   # While Statement\n");
        asm += &self.open_control_scope(branch_locals(body))?;
        asm += &format!("while_entry_{count}:\n");
        asm += &self.generate_expr(condition)?;
        asm += &format!("   li $t1 0\n   beq $a0 $t1 while_exit_{count}\n");
        if let Some(body) = body {
            asm += &self.lower_branch_body(body)?;
        }
        asm += &format!("   b while_entry_{count}\nwhile_exit_{count}:\n");
        asm += &self.close_control_scope();
        Ok(asm)
    }

    fn next_control_label(&mut self) -> u32 {
        let count = self.control_statement_count;
        self.control_statement_count += 1;
        count
    }

    /// Lower a control-flow branch: open a scope for its locals (empty if
    /// the branch isn't a brace-delimited block), lower its statements
    /// (with `return` unwinding any pending nested scopes), then tear the
    /// scope down. `if`/`else` branches run at most once, so opening and
    /// closing the scope around a single pass over the branch is enough;
    /// `while` needs the scope to outlive every iteration and uses
    /// [`Self::lower_branch_body`] directly instead (see
    /// [`Self::generate_iteration`]).
    fn lower_branch(&mut self, stmt: &Stmt) -> Result<String> {
        let mut asm = self.open_control_scope(branch_locals(Some(stmt)))?;
        asm += &self.lower_branch_body(stmt)?;
        asm += &self.close_control_scope();
        Ok(asm)
    }

    /// Lower a branch's statements without opening or closing its scope.
    fn lower_branch_body(&mut self, stmt: &Stmt) -> Result<String> {
        match stmt {
            Stmt::Compound(c) => {
                let mut asm = String::new();
                for s in &c.statements {
                    asm += &self.lower_control_body_stmt(s)?;
                }
                Ok(asm)
            }
            other => self.lower_control_body_stmt(other),
        }
    }

    fn lower_control_body_stmt(&mut self, stmt: &Stmt) -> Result<String> {
        if let Stmt::Return { value, .. } = stmt {
            let mut asm = match value {
                Some(expr) => self.generate_expr(expr)?,
                None => String::new(),
            };
            let offset = self.symbols.control_statement_offset();
            asm += &format!(
                "   addiu $fp $fp {offset}\n   move $sp $fp\n   addiu $sp $sp -4\n   b {}_exit\n",
                self.current_function_label
            );
            Ok(asm)
        } else {
            self.generate_stmt(stmt)
        }
    }

    fn open_control_scope(&mut self, locals: &[VarDeclaration]) -> Result<String> {
        let mut asm = String::from("   sw $fp 0($sp)\n   addiu $sp $sp -4\n");
        self.symbols.enter_block_scope(locals);

        let vars: Vec<_> = self.symbols.current_scope().cloned().collect();
        for var in vars.iter().rev() {
            if var.array_size != 0 {
                asm += &format!("   li $v0 9\n   li $a0 {}\n   syscall\n   move $a0, $v0\n", var.array_size * WORD);
            }
            asm += "   sw $a0 0($sp)\n   addiu $sp $sp -4\n";
        }

        asm += "   move $fp $sp\n   addiu $sp $sp -4\n\n";
        Ok(asm)
    }

    fn close_control_scope(&mut self) -> String {
        let frame_size = WORD * self.symbols.current_scope().count() as u32 + 8;
        self.symbols.pop_scope();
        format!(
            "   # erase logically the control statement variables\n   addiu $sp $sp {frame_size}\n   move $fp $sp\n   addiu $fp $fp 4\n\n"
        )
    }

    fn generate_expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Num { value, .. } => Ok(format!("   li $a0 {value}\n")),
            Expr::Var { name, index, .. } => self.generate_id(name, index.as_deref()),
            Expr::Assignment { target, value, .. } => self.generate_assignment(target, value),
            Expr::Call { name, args, .. } => self.generate_caller_code(name, args),
            Expr::BinaryOp { op, lhs, rhs, .. } => self.generate_binary_op(*op, lhs, rhs),
        }
    }

    fn generate_id(&mut self, name: &str, index: Option<&Expr>) -> Result<String> {
        let symbol = self
            .symbols
            .get_symbol(name)
            .ok_or_else(|| CodeGenError::UndefinedSymbol(name.to_string()))?
            .clone();

        if symbol.is_global {
            if symbol.ty == mcc_sem::Type::Array {
                return match index {
                    Some(index_expr) => {
                        let mut asm = self.generate_expr(index_expr)?;
                        asm += &format!(
                            "   li $t1 4\n   mult $a0, $t1\n   mflo $a0\n   lw $t0, {name}\n   addu $t0 $t0 $a0\n   lw $a0, ($t0)\n"
                        );
                        Ok(asm)
                    }
                    None => Ok(format!("   lw $a0, {name}\n")),
                };
            }
            return Ok(format!("   lw $a0, {name}\n"));
        }

        let fp_offset = symbol.pos as i32 * WORD as i32 + self.symbols.scope_offset(name);
        if symbol.ty == mcc_sem::Type::Array {
            match index {
                Some(index_expr) => {
                    let mut asm = self.generate_expr(index_expr)?;
                    asm += &format!(
                        "   li $t1 4\n   mult $a0, $t1\n   mflo $a0\n   lw $t0, {fp_offset}($fp)\n   addu $t0 $t0 $a0\n   lw $a0, ($t0)\n"
                    );
                    Ok(asm)
                }
                None => Ok(format!("   lw $a0, {fp_offset}($fp)\n")),
            }
        } else {
            Ok(format!("   lw $a0, {fp_offset}($fp)\n"))
        }
    }

    fn generate_assignment(&mut self, target: &Expr, value: &Expr) -> Result<String> {
        let mut asm = self.generate_expr(value)?;

        let Expr::Var { name, index, .. } = target else {
            // The type checker never accepts a non-identifier assignment
            // target; the grammar itself never parses one.
            return Err(CodeGenError::UndefinedSymbol("<non-identifier assignment target>".to_string()));
        };

        let symbol = self
            .symbols
            .get_symbol(name)
            .ok_or_else(|| CodeGenError::UndefinedSymbol(name.to_string()))?
            .clone();

        let location = if symbol.is_global {
            format!("{name}")
        } else {
            format!("{}($fp)", symbol.pos as i32 * WORD as i32 + self.symbols.scope_offset(name))
        };

        if symbol.ty == mcc_sem::Type::Array {
            if let Some(index_expr) = index.as_deref() {
                asm += "   sw $a0 0($sp)\n   addiu $sp $sp -4\n";
                asm += &self.generate_expr(index_expr)?;
                asm += &format!(
                    "   li $t1 4\n   mult $a0, $t1\n   mflo $a0\n   lw $t0, {location}\n   addu $t0 $t0 $a0\n   lw $t1, 4($sp)\n   addiu $sp $sp 4\n   sw $t1, ($t0)\n"
                );
                return Ok(asm);
            }
            // whole-array assignment: copy the source handle, aliasing the
            // same heap block under the target's name.
            asm += &format!("   sw $a0, {location}\n");
            return Ok(asm);
        }

        asm += &format!("   sw $a0, {location}\n");
        Ok(asm)
    }

    fn generate_binary_op(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<String> {
        let mut asm = self.generate_expr(lhs)?;
        asm += "   sw $a0 0($sp)\n   addiu $sp $sp -4\n";
        asm += &self.generate_expr(rhs)?;
        asm += "   lw $t1 4($sp)\n   addiu $sp $sp 4\n";

        asm += match op {
            BinOp::Add => "   add $a0 $t1 $a0\n",
            BinOp::Sub => "   sub $a0 $t1 $a0\n",
            BinOp::Mul => "   mult $a0 $t1\n   mflo $a0\n",
            BinOp::Div => "   div $t1 $a0\n   mflo $a0\n",
            BinOp::Le => "   sle $a0 $t1 $a0\n",
            BinOp::Lt => "   slt $a0 $t1 $a0\n",
            BinOp::Ge => "   sle $a0 $a0 $t1\n",
            BinOp::Gt => "   slt $a0 $a0 $t1\n",
            BinOp::Eq => "   seq $a0 $a0 $t1\n",
            BinOp::Ne => "   sne $a0 $a0 $t1\n",
        };
        Ok(asm)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_par::Parser;
    use mcc_util::Handler;

    fn generate(source: &str) -> String {
        let mut handler = Handler::new();
        let mut parser = Parser::new(source, &mut handler).unwrap();
        let program = parser.parse().unwrap();
        assert!(!handler.has_errors());

        let mut sem_handler = Handler::new();
        let mut checker = mcc_sem::TypeChecker::new(&mut sem_handler, source);
        assert!(checker.check(&program).unwrap(), "fixture must type-check cleanly");

        let mut gen = CodeGenerator::new();
        gen.generate(&program).unwrap()
    }

    #[test]
    fn program_without_main_emits_nothing() {
        let asm = generate("int f(void) { return 1; }");
        assert!(asm.is_empty());
    }

    #[test]
    fn simple_output_program_assembles() {
        let asm = generate("void main(void) { int x; x = 5; output(x); }");
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("main_entry:"));
        assert!(asm.contains("li $v0, 1"));
        assert!(asm.contains("jal main_entry"));
    }

    #[test]
    fn global_array_gets_heap_allocated_at_program_start() {
        let asm = generate("int arr[10]; void main(void) { output(arr[0]); }");
        assert!(asm.contains("arr: .space 40"));
        assert!(asm.contains("li $v0 9"));
    }

    #[test]
    fn function_call_passes_arguments_and_jumps_to_entry() {
        let asm = generate(
            "int f(int a, int b) { return a + b; } void main(void) { output(f(1, 2)); }",
        );
        assert!(asm.contains("f_entry:"));
        assert!(asm.contains("jal f_entry"));
    }

    #[test]
    fn while_loop_emits_unique_labels() {
        let asm = generate("void main(void) { int i; i = 0; while (i < 3) { i = i + 1; } }");
        assert!(asm.contains("while_entry_0:"));
        assert!(asm.contains("while_exit_0:"));
    }

    #[test]
    fn nested_control_statements_get_distinct_labels() {
        let asm = generate(
            "void main(void) { int i; i = 0; while (i < 3) { if (i < 1) i = i + 1; else i = i + 2; } }",
        );
        assert!(asm.contains("while_entry_0:"));
        assert!(asm.contains("true_branch_1:"));
    }

    #[test]
    fn if_without_braces_still_lowers() {
        let asm = generate("void main(void) { int x; x = 1; if (x) x = 2; }");
        assert!(asm.contains("true_branch_0:"));
    }

    #[test]
    fn array_parameter_indexing_reads_through_the_handle() {
        let asm = generate(
            "int f(int a[], int n) { return a[0]; } void main(void) { int v[3]; v[0]=7; output(f(v,3)); }",
        );
        assert!(asm.contains("f_entry:"));
    }

    #[test]
    fn early_return_inside_if_unwinds_before_branching_to_exit() {
        let asm = generate("int f(void) { if (1) return 1; return 0; }\nvoid main(void) { output(f()); }");
        assert!(asm.contains("f_exit:"));
        assert!(asm.contains("addiu $fp $fp"));
    }
}
