//! Code generation: lower a program into NASM x86-64 assembly for Linux.
//!
//! The native stack doubles as the operand stack, so every operation pops
//! its inputs into scratch registers and pushes its result back. Output is
//! built as a list of [`Line`] records and rendered by a single formatter;
//! the fixed `dump` runtime routine and the per-operation lowering are built
//! separately so each can be inspected on its own.

use std::fmt;
use std::io::Write;

use crate::error::CompileResult;
use crate::op::{Op, OpKind, Program};

/// Symbol of the program entry point.
pub const ENTRY: &str = "_start";
/// Symbol of the decimal-print runtime routine.
pub const DUMP_ROUTINE: &str = "dump";

/// One line of the assembly listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
  Directive(String),
  Label(String),
  Comment(String),
  Instr {
    mnemonic: &'static str,
    operands: String,
  },
}

impl Line {
  fn directive(text: impl Into<String>) -> Self {
    Self::Directive(text.into())
  }

  fn label(name: impl Into<String>) -> Self {
    Self::Label(name.into())
  }

  fn comment(text: impl Into<String>) -> Self {
    Self::Comment(text.into())
  }

  fn instr(mnemonic: &'static str, operands: impl Into<String>) -> Self {
    Self::Instr {
      mnemonic,
      operands: operands.into(),
    }
  }

  fn bare(mnemonic: &'static str) -> Self {
    Self::instr(mnemonic, "")
  }
}

impl fmt::Display for Line {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Line::Directive(text) => f.write_str(text),
      Line::Label(name) => write!(f, "{name}:"),
      Line::Comment(text) => write!(f, "    {text}"),
      Line::Instr { mnemonic, operands } if operands.is_empty() => write!(f, "    {mnemonic}"),
      Line::Instr { mnemonic, operands } => write!(f, "    {mnemonic:<7} {operands}"),
    }
  }
}

/// A complete assembly listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
  lines: Vec<Line>,
}

impl Listing {
  pub fn lines(&self) -> &[Line] {
    &self.lines
  }

  fn extend(&mut self, lines: impl IntoIterator<Item = Line>) {
    self.lines.extend(lines);
  }

  /// Render the listing into `out`, one record per line.
  pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
    for line in &self.lines {
      writeln!(out, "{line}")?;
    }
    Ok(())
  }
}

impl fmt::Display for Listing {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for line in &self.lines {
      writeln!(f, "{line}")?;
    }
    Ok(())
  }
}

/// Emit the full listing for a program.
///
/// The program's stack effect is checked first, so an underflow is reported
/// here as it would be by the simulator instead of faulting at run time.
pub fn generate(program: &Program) -> CompileResult<Listing> {
  program.check_stack()?;

  let mut asm = Listing::default();
  asm.extend([Line::directive("segment .text")]);
  asm.extend(dump_routine());
  asm.extend([
    Line::directive(format!("global {ENTRY}")),
    Line::label(ENTRY),
  ]);
  for op in program {
    asm.extend(lower_op(op));
  }
  asm.extend(exit_epilogue());

  log::debug!(
    "generated {} line(s) for {} operation(s)",
    asm.lines.len(),
    program.len()
  );
  Ok(asm)
}

/// Instructions for a single operation, headed by a marker comment.
pub fn lower_op(op: &Op) -> Vec<Line> {
  match op.kind {
    OpKind::Push => {
      let value = op.value;
      let mut lines = vec![Line::comment(format!(";; -- push {value} --"))];
      // `push imm` only encodes a sign-extended 32-bit immediate.
      if i32::try_from(value).is_ok() {
        lines.push(Line::instr("push", value.to_string()));
      } else {
        lines.push(Line::instr("mov", format!("rax, {value}")));
        lines.push(Line::instr("push", "rax"));
      }
      lines
    }
    OpKind::Plus => vec![
      Line::comment(";; -- plus --"),
      Line::instr("pop", "rax"),
      Line::instr("pop", "rbx"),
      Line::instr("add", "rax, rbx"),
      Line::instr("push", "rax"),
    ],
    OpKind::Minus => vec![
      Line::comment(";; -- minus --"),
      Line::instr("pop", "rax"),
      Line::instr("pop", "rbx"),
      Line::instr("sub", "rbx, rax"),
      Line::instr("push", "rbx"),
    ],
    OpKind::Dump => vec![
      Line::comment(";; -- dump --"),
      Line::instr("pop", "rdi"),
      Line::instr("call", DUMP_ROUTINE),
    ],
  }
}

/// Print the unsigned 64-bit value in `rdi` as decimal plus a newline via `write(2)`.
///
/// Digits are produced by multiplying with the fixed-point reciprocal of 10
/// (0xCCCCCCCCCCCCCCCD, written as a signed literal) instead of dividing.
pub fn dump_routine() -> Vec<Line> {
  vec![
    Line::label(DUMP_ROUTINE),
    Line::comment("; Implementation of dump function"),
    Line::instr("mov", "r9, -3689348814741910323"),
    Line::instr("sub", "rsp, 40"),
    Line::instr("mov", "BYTE [rsp+31], 10"),
    Line::instr("lea", "rcx, [rsp+30]"),
    Line::label(".L2"),
    Line::instr("mov", "rax, rdi"),
    Line::instr("lea", "r8, [rsp+32]"),
    Line::instr("mul", "r9"),
    Line::instr("mov", "rax, rdi"),
    Line::instr("sub", "r8, rcx"),
    Line::instr("shr", "rdx, 3"),
    Line::instr("lea", "rsi, [rdx+rdx*4]"),
    Line::instr("add", "rsi, rsi"),
    Line::instr("sub", "rax, rsi"),
    Line::instr("add", "eax, 48"),
    Line::instr("mov", "BYTE [rcx], al"),
    Line::instr("mov", "rax, rdi"),
    Line::instr("mov", "rdi, rdx"),
    Line::instr("mov", "rdx, rcx"),
    Line::instr("sub", "rcx, 1"),
    Line::instr("cmp", "rax, 9"),
    Line::instr("ja", ".L2"),
    Line::instr("lea", "rax, [rsp+32]"),
    Line::instr("mov", "edi, 1"),
    Line::instr("sub", "rdx, rax"),
    Line::instr("xor", "eax, eax"),
    Line::instr("lea", "rsi, [rsp+32+rdx]"),
    Line::instr("mov", "rdx, r8"),
    Line::instr("mov", "rax, 1"),
    Line::bare("syscall"),
    Line::instr("add", "rsp, 40"),
    Line::bare("ret"),
  ]
}

/// `exit(0)` through the raw syscall.
fn exit_epilogue() -> Vec<Line> {
  vec![
    Line::instr("mov", "rax, 60"),
    Line::instr("xor", "edi, edi"),
    Line::bare("syscall"),
  ]
}
