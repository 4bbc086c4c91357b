//! Lexical analysis: split the source into whitespace-delimited words.
//!
//! Words carry their byte span so the parser can anchor diagnostics at the
//! exact token that failed to parse.

/// A single word of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(loc: usize, len: usize) -> Self {
    Self { loc, len }
  }
}

/// Lex the input into words. Runs of whitespace never produce empty tokens.
pub fn tokenize(input: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let mut start: Option<usize> = None;

  for (i, c) in input.char_indices() {
    match (c.is_whitespace(), start) {
      (true, Some(s)) => {
        tokens.push(Token::new(s, i - s));
        start = None;
      }
      (false, None) => start = Some(i),
      _ => {}
    }
  }
  if let Some(s) = start {
    tokens.push(Token::new(s, input.len() - s));
  }

  log::debug!("tokenized {} word(s)", tokens.len());
  tokens
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}
