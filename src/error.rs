//! Shared error type for every stage of the toolchain.
//!
//! Parse diagnostics keep the caret style: the offending source line is
//! echoed and a marker points at the byte where the bad token starts.

use std::path::PathBuf;
use std::process::ExitStatus;

use snafu::Snafu;

use crate::op::OpKind;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("{line}:{column}: {message}\n{line_text}\n{marker}"))]
  Parse {
    line: usize,
    column: usize,
    line_text: String,
    marker: String,
    message: String,
  },

  #[snafu(display(
    "stack underflow at operation #{index} ({op}): needs {needed} operand(s), found {available}"
  ))]
  StackUnderflow {
    index: usize,
    op: OpKind,
    needed: usize,
    available: usize,
  },

  #[snafu(display("could not {action} {}: {source}", path.display()))]
  Io {
    action: &'static str,
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("could not {action} program output: {source}"))]
  Output {
    action: &'static str,
    source: std::io::Error,
  },

  #[snafu(display(
    "opcode table out of sync: the model defines {defined} opcodes but the parser handles {handled}"
  ))]
  OpcodeCount { defined: usize, handled: usize },

  #[snafu(display("failed to run `{command}`: {source}"))]
  ToolSpawn {
    command: String,
    source: std::io::Error,
  },

  #[snafu(display("`{command}` exited with {status}"))]
  ToolFailed { command: String, status: ExitStatus },
}

impl CompileError {
  /// Construct a parse error anchored at byte offset `loc` of `source`.
  pub fn at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let safe_loc = loc.min(source.len());
    let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |i| safe_loc + i);
    let line = source[..line_start].matches('\n').count() + 1;
    let column = source[line_start..safe_loc].chars().count();
    Self::Parse {
      line,
      column: column + 1,
      line_text: source[line_start..line_end].to_string(),
      marker: format!("{}^", " ".repeat(column)),
      message: message.into(),
    }
  }

  /// Process exit status the driver reports for this error.
  pub fn exit_code(&self) -> u8 {
    match self {
      Self::ToolFailed { status, .. } => status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .filter(|&code| code != 0)
        .unwrap_or(1),
      _ => 1,
    }
  }
}
