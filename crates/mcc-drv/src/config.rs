//! Everything that varies between one invocation of `mcc` and the next.

use std::path::{Path, PathBuf};

/// What a run of the driver should produce, beyond the pass/fail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// Run `check_syntax` + `check_typing` and report the verdict.
    Check,
    /// Run the full pipeline and write assembly to the configured output path.
    Assembly,
    /// Run only the lexer and print its token stream.
    Tokens,
    /// Run the lexer and parser and print an s-expression AST.
    Ast,
}

/// Collects the input file, output path, emit mode, strict flag, and
/// verbosity for one compilation. Built once from parsed CLI arguments and
/// read-only for the rest of the run — there is no persisted configuration
/// file, since every invocation is independent.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub emit: Emit,
    pub strict: bool,
    pub verbose: bool,
}

impl Config {
    pub fn new(input: impl Into<PathBuf>, emit: Emit) -> Self {
        let input = input.into();
        let output = default_output_path(&input);
        Self {
            input,
            output,
            emit,
            strict: false,
            verbose: false,
        }
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        if let Some(output) = output {
            self.output = output;
        }
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// `FILE.c` → `FILE.s`; a file with no extension just gets `.s` appended.
fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_swaps_the_extension() {
        assert_eq!(default_output_path(Path::new("prog.c")), PathBuf::from("prog.s"));
    }

    #[test]
    fn default_output_path_appends_when_there_is_none() {
        assert_eq!(default_output_path(Path::new("prog")), PathBuf::from("prog.s"));
    }
}
