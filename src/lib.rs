//! Crate root: wires together the toolchain for the stack language.
//!
//! - `tokenizer` splits source text into whitespace-delimited words.
//! - `parser` maps words onto the operations defined in `op`.
//! - `simulator` evaluates a program directly on an in-memory stack.
//! - `codegen` lowers a program into NASM x86-64 assembly.
//! - `toolchain` writes the listing and drives the external assembler and linker.
//! - `error` holds the error type shared by all of the above.

pub mod codegen;
pub mod error;
pub mod op;
pub mod parser;
pub mod simulator;
pub mod tokenizer;
pub mod toolchain;

use std::fs;
use std::io::Write;
use std::path::Path;

use snafu::ResultExt;

use crate::error::IoSnafu;

pub use error::{CompileError, CompileResult};
pub use op::{Op, OpKind, Program};

/// Read the source file at `path` and parse it.
pub fn load_program(path: &Path) -> CompileResult<Program> {
  let source = fs::read_to_string(path).context(IoSnafu {
    action: "read",
    path,
  })?;
  log::debug!("loaded {} ({} bytes)", path.display(), source.len());
  parser::parse(&source)
}

/// Parse and simulate `source`, writing dumped values to `out`.
pub fn simulate_source<W: Write>(source: &str, out: &mut W) -> CompileResult<()> {
  let program = parser::parse(source)?;
  simulator::simulate(&program, out)
}

/// Compile a source string into NASM assembly text.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let program = parser::parse(source)?;
  Ok(codegen::generate(&program)?.to_string())
}
