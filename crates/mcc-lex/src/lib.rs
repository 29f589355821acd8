//! Lexical analysis for MiniC.
//!
//! The lexer is a hand-written DFA over a fixed set of states, one character
//! of lookahead at a time: every state transition consumes at most one
//! character, and a token closes the instant the DFA reaches a state with no
//! further transition for the character it just saw. That lookahead
//! character is *not* consumed — it is re-examined as the first character of
//! the next token. This is the same design as a classic table-driven
//! tokenizer for a C-like grammar; reserved words are recognized by checking
//! an identifier's spelling against a fixed set only once the DFA has
//! already decided "this is an identifier-shaped token".
//!
//! Comments (`/* ... */`) are consumed entirely inside the DFA and never
//! reach the token stream. An unterminated comment is not an error: the
//! lexer simply runs out of input while still inside the comment and emits
//! `Endfile`, matching how end-of-input is handled everywhere else.

use mcc_util::{Diagnostic, Handler, LineIndex, Span};
use std::fmt;

/// The kind of a lexical token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Reserved words
    Else,
    If,
    Int,
    Return,
    Void,
    While,

    // Operators
    Plus,
    Minus,
    Times,
    Over,
    Leth,
    Letheq,
    Bith,
    Bitheq,
    Eq,
    Neq,
    Assign,

    // Punctuation
    Semicolon,
    Comma,
    Lpar,
    Rpar,
    Lbra,
    Rbra,
    Lkey,
    Rkey,

    // Other tokens
    Id,
    Num,
    Endfile,
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Else => "else",
            TokenKind::If => "if",
            TokenKind::Int => "int",
            TokenKind::Return => "return",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Times => "*",
            TokenKind::Over => "/",
            TokenKind::Leth => "<",
            TokenKind::Letheq => "<=",
            TokenKind::Bith => ">",
            TokenKind::Bitheq => ">=",
            TokenKind::Eq => "==",
            TokenKind::Neq => "!=",
            TokenKind::Assign => "=",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Lpar => "(",
            TokenKind::Rpar => ")",
            TokenKind::Lbra => "[",
            TokenKind::Rbra => "]",
            TokenKind::Lkey => "{",
            TokenKind::Rkey => "}",
            TokenKind::Id => "ID",
            TokenKind::Num => "NUM",
            TokenKind::Endfile => "$",
            TokenKind::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// A single lexed token: its kind, the exact text it matched, and its
/// location in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

fn reserved_word(lexeme: &str) -> Option<TokenKind> {
    Some(match lexeme {
        "else" => TokenKind::Else,
        "if" => TokenKind::If,
        "int" => TokenKind::Int,
        "return" => TokenKind::Return,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        _ => return None,
    })
}

fn simple_symbol(lexeme: &str) -> TokenKind {
    match lexeme {
        "(" => TokenKind::Lpar,
        ")" => TokenKind::Rpar,
        "[" => TokenKind::Lbra,
        "]" => TokenKind::Rbra,
        "{" => TokenKind::Lkey,
        "}" => TokenKind::Rkey,
        "+" => TokenKind::Plus,
        "-" => TokenKind::Minus,
        "*" => TokenKind::Times,
        ";" => TokenKind::Semicolon,
        "," => TokenKind::Comma,
        other => unreachable!("not a simple symbol: {other:?}"),
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_number(c: char) -> bool {
    c.is_ascii_digit()
}

/// The sentinel character appended past the end of the source, standing in
/// for end-of-input so every DFA state can treat "one more character of
/// lookahead" uniformly instead of special-casing `None`.
const SENTINEL: char = '\u{0}';

fn is_white_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r') || c == SENTINEL
}

fn is_simple_sym(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '+' | '-' | '*' | ';' | ',')
}

/// Single-character members of the operator set, used only to decide
/// whether a character terminates the token being built — `!` is handled
/// separately since `!=` is the only legal use of it.
fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=')
}

fn is_special_symbol_char(c: char) -> bool {
    matches!(c, ';' | ',' | '(' | ')' | '[' | ']' | '{' | '}')
}

/// Does `c` terminate an identifier or number (cannot extend it)?
fn terminates_word(c: char) -> bool {
    is_white_space(c) || is_operator_char(c) || is_special_symbol_char(c)
}

/// Does `c` terminate a single-character token (symbol, relational
/// operator, `/`, `=`) — anything at all, since such tokens never extend?
fn terminates_symbol(c: char) -> bool {
    is_white_space(c)
        || is_operator_char(c)
        || is_special_symbol_char(c)
        || is_letter(c)
        || is_number(c)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Id,
    Num,
    SimpleSym,
    Slash,
    InComment,
    CommentStar,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    EqSign,
    EqEq,
    Bang,
    BangEq,
    DoneId,
    DoneNum,
    DoneSimpleSym,
    DoneOver,
    CommentEnd,
    DoneLess,
    DoneLessEq,
    DoneGreater,
    DoneGreaterEq,
    DoneAssign,
    DoneEq,
    DoneNeq,
    DoneEndfile,
    DoneError,
}

impl State {
    fn is_final(self) -> bool {
        !matches!(
            self,
            State::Start
                | State::Id
                | State::Num
                | State::SimpleSym
                | State::Slash
                | State::InComment
                | State::CommentStar
                | State::Less
                | State::LessEq
                | State::Greater
                | State::GreaterEq
                | State::EqSign
                | State::EqEq
                | State::Bang
                | State::BangEq
        )
    }
}

/// Tokenizes a single MiniC source file.
///
/// Mirrors the pipeline's shared error-handling discipline: a lexical error
/// reports a diagnostic to the [`Handler`] and, in non-strict mode, yields an
/// `Error` token so the caller can keep scanning for more problems instead of
/// stopping at the very first one.
pub struct Lexer<'source> {
    source: &'source str,
    chars: Vec<char>,
    pos: usize,
    line_index: LineIndex,
    handler: &'source mut Handler,
    done: bool,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str, handler: &'source mut Handler) -> Self {
        let mut chars: Vec<char> = source.chars().collect();
        chars.push(SENTINEL);
        Self {
            source,
            chars,
            pos: 0,
            line_index: LineIndex::new(source),
            handler,
            done: false,
        }
    }

    fn current(&self) -> char {
        self.chars[self.pos]
    }

    /// The source text this lexer was built from, for diagnostic rendering
    /// by callers that compose a `Lexer` into their own pass (the parser).
    pub fn source(&self) -> &'source str {
        self.source
    }

    /// Borrow the diagnostic handler this lexer reports to, for callers
    /// that compose a `Lexer` into their own pass and need to emit their
    /// own diagnostics through the same handler.
    pub fn handler_mut(&mut self) -> &mut Handler {
        self.handler
    }

    fn span_for(&self, start: usize, end: usize) -> Span {
        self.line_index.span_at(start, end)
    }

    fn error_message(state: State, c: char) -> String {
        match state {
            State::Id if is_number(c) => "a number cannot be part of an ID".to_string(),
            State::Id => format!("unexpected character '{c}' in an ID creation"),
            State::Num if is_letter(c) => "a letter cannot be next to a number".to_string(),
            State::Num => format!("unexpected character '{c}' after number"),
            State::Bang => format!("invalid character '{c}' after '!', did you mean !="),
            _ => format!("unexpected character '{c}'"),
        }
    }

    /// Advance the DFA by one character, returning the next state. On an
    /// illegal character this also reports the diagnostic and consumes the
    /// offending character, matching the original recovery strategy: resume
    /// lexing one character later rather than aborting the whole scan.
    fn step(&mut self, state: State, c: char) -> Result<State, String> {
        let next = match state {
            State::Start => {
                if is_letter(c) {
                    State::Id
                } else if is_number(c) {
                    State::Num
                } else if is_simple_sym(c) {
                    State::SimpleSym
                } else if c == '/' {
                    State::Slash
                } else if c == '<' {
                    State::Less
                } else if c == '>' {
                    State::Greater
                } else if c == '=' {
                    State::EqSign
                } else if c == '!' {
                    State::Bang
                } else if c == SENTINEL {
                    State::DoneEndfile
                } else if is_white_space(c) {
                    State::Start
                } else {
                    return self.recover(State::Start, c);
                }
            }
            State::Id => {
                if terminates_word(c) {
                    State::DoneId
                } else if is_letter(c) {
                    State::Id
                } else {
                    return self.recover(State::Id, c);
                }
            }
            State::Num => {
                if terminates_word(c) {
                    State::DoneNum
                } else if is_number(c) {
                    State::Num
                } else {
                    return self.recover(State::Num, c);
                }
            }
            State::SimpleSym => {
                if terminates_symbol(c) {
                    State::DoneSimpleSym
                } else {
                    return self.recover(State::SimpleSym, c);
                }
            }
            State::Slash => {
                if c == '*' {
                    State::InComment
                } else if terminates_symbol(c) {
                    State::DoneOver
                } else {
                    return self.recover(State::Slash, c);
                }
            }
            State::InComment => {
                if c == '*' {
                    State::CommentStar
                } else if c == SENTINEL {
                    State::DoneEndfile
                } else {
                    State::InComment
                }
            }
            State::CommentStar => {
                if c == '/' {
                    State::CommentEnd
                } else if c == SENTINEL {
                    State::DoneEndfile
                } else {
                    State::InComment
                }
            }
            State::Less => {
                if c == '=' {
                    State::LessEq
                } else if terminates_symbol(c) {
                    State::DoneLess
                } else {
                    return self.recover(State::Less, c);
                }
            }
            State::LessEq => {
                if terminates_symbol(c) {
                    State::DoneLessEq
                } else {
                    return self.recover(State::LessEq, c);
                }
            }
            State::Greater => {
                if c == '=' {
                    State::GreaterEq
                } else if terminates_symbol(c) {
                    State::DoneGreater
                } else {
                    return self.recover(State::Greater, c);
                }
            }
            State::GreaterEq => {
                if terminates_symbol(c) {
                    State::DoneGreaterEq
                } else {
                    return self.recover(State::GreaterEq, c);
                }
            }
            State::EqSign => {
                if c == '=' {
                    State::EqEq
                } else if terminates_symbol(c) {
                    State::DoneAssign
                } else {
                    return self.recover(State::EqSign, c);
                }
            }
            State::EqEq => {
                if terminates_symbol(c) {
                    State::DoneEq
                } else {
                    return self.recover(State::EqEq, c);
                }
            }
            State::Bang => {
                if c == '=' {
                    State::BangEq
                } else {
                    return self.recover(State::Bang, c);
                }
            }
            State::BangEq => {
                if terminates_symbol(c) {
                    State::DoneNeq
                } else {
                    return self.recover(State::BangEq, c);
                }
            }
            done => done,
        };
        Ok(next)
    }

    fn recover(&mut self, state: State, c: char) -> Result<State, String> {
        let message = Self::error_message(state, c);
        let span = self.span_for(self.pos, self.pos + 1);
        self.handler.emit(Diagnostic::syntax(message, span), self.source)?;
        self.pos += 1;
        Ok(State::DoneError)
    }

    /// Scan and return the next token, or the rendered strict-mode error
    /// message if a lexical error was fatal.
    pub fn next_token(&mut self) -> Result<Token, String> {
        let mut state = State::Start;
        let mut start = self.pos;
        loop {
            if state == State::Start {
                start = self.pos;
            }
            let c = self.current();
            state = self.step(state, c)?;

            if state == State::CommentEnd {
                state = State::Start;
                self.pos += 1;
                continue;
            }
            if state.is_final() {
                let span = self.span_for(start, self.pos);
                let lexeme: String = self.chars[start..self.pos].iter().collect();
                let kind = match state {
                    State::DoneId => reserved_word(&lexeme).unwrap_or(TokenKind::Id),
                    State::DoneNum => TokenKind::Num,
                    State::DoneSimpleSym => simple_symbol(&lexeme),
                    State::DoneOver => TokenKind::Over,
                    State::DoneLess => TokenKind::Leth,
                    State::DoneLessEq => TokenKind::Letheq,
                    State::DoneGreater => TokenKind::Bith,
                    State::DoneGreaterEq => TokenKind::Bitheq,
                    State::DoneAssign => TokenKind::Assign,
                    State::DoneEq => TokenKind::Eq,
                    State::DoneNeq => TokenKind::Neq,
                    State::DoneEndfile => TokenKind::Endfile,
                    State::DoneError => TokenKind::Error,
                    _ => unreachable!("non-final state reached token assembly"),
                };
                let lexeme = match kind {
                    TokenKind::Endfile => "$".to_string(),
                    TokenKind::Error => String::new(),
                    _ => lexeme,
                };
                return Ok(Token { kind, lexeme, span });
            }

            self.pos += 1;
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<Token, String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_token() {
            Ok(token) => {
                if token.kind == TokenKind::Endfile {
                    self.done = true;
                }
                Some(Ok(token))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
