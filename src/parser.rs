//! Map source words onto operations.
//!
//! Symbols come from a fixed table; every other word must be a base-10 signed
//! integer and becomes a push. The table is checked against the operation
//! model before the first word is looked at.

use std::collections::HashSet;

use crate::error::{CompileError, CompileResult};
use crate::op::{Op, OpKind, Program, check_op_count};
use crate::tokenizer::{Token, token_text, tokenize};

/// Symbolic words. Integer literals cover `OpKind::Push`.
pub const SYMBOLS: &[(&str, Op)] = &[("+", Op::plus()), ("-", Op::minus()), ("=>", Op::dump())];

/// Parse a full source text into a program.
pub fn parse(source: &str) -> CompileResult<Program> {
  parse_with_symbols(source, SYMBOLS)
}

/// Parse a single word. The error is anchored at the start of `word`.
pub fn parse_word(word: &str) -> CompileResult<Op> {
  check_symbols(SYMBOLS)?;
  lookup(word, SYMBOLS).ok_or_else(|| invalid_word(word, 0, word))
}

fn parse_with_symbols(source: &str, symbols: &[(&str, Op)]) -> CompileResult<Program> {
  check_symbols(symbols)?;

  let tokens = tokenize(source);
  let program = tokens
    .iter()
    .map(|token| parse_token(token, source, symbols))
    .collect::<CompileResult<Program>>()?;

  log::debug!("parsed {} operation(s)", program.len());
  Ok(program)
}

fn parse_token(token: &Token, source: &str, symbols: &[(&str, Op)]) -> CompileResult<Op> {
  let word = token_text(token, source);
  lookup(word, symbols).ok_or_else(|| invalid_word(source, token.loc, word))
}

fn lookup(word: &str, symbols: &[(&str, Op)]) -> Option<Op> {
  if let Some((_, op)) = symbols.iter().find(|(sym, _)| *sym == word) {
    return Some(*op);
  }
  word.parse::<i64>().ok().map(Op::push)
}

/// Opcodes reachable through `symbols` plus the integer-literal fallback.
fn check_symbols(symbols: &[(&str, Op)]) -> CompileResult<()> {
  let handled: HashSet<OpKind> = symbols
    .iter()
    .map(|(_, op)| op.kind)
    .chain([OpKind::Push])
    .collect();
  check_op_count(handled.len())
}

fn invalid_word(source: &str, loc: usize, word: &str) -> CompileError {
  let digits = word.strip_prefix(['+', '-']).unwrap_or(word);
  let message = if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
    format!("integer literal `{word}` does not fit in 64 bits")
  } else {
    format!("invalid word `{word}`")
  };
  CompileError::at(source, loc, message)
}
