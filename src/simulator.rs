//! Direct interpreter over an in-memory operand stack.
//!
//! Arithmetic wraps at 64 bits and dumped values are printed as unsigned
//! 64-bit decimals, so the output agrees with the compiled program.

use std::io::Write;

use snafu::ResultExt;

use crate::error::{CompileError, CompileResult, OutputSnafu};
use crate::op::{Op, OpKind, Program};

#[derive(Debug, Default)]
pub struct Simulator {
  stack: Vec<i64>,
}

impl Simulator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Values currently on the operand stack, bottom first.
  pub fn stack(&self) -> &[i64] {
    &self.stack
  }

  /// Run `program` from an empty stack, writing each dumped value as a line to `out`.
  pub fn run<W: Write>(&mut self, program: &Program, out: &mut W) -> CompileResult<()> {
    self.stack.clear();
    for (index, op) in program.iter().enumerate() {
      self.step(index, op, out)?;
    }
    out.flush().context(OutputSnafu { action: "flush" })?;
    log::debug!("simulation finished with {} value(s) left", self.stack.len());
    Ok(())
  }

  fn step<W: Write>(&mut self, index: usize, op: &Op, out: &mut W) -> CompileResult<()> {
    let needed = op.kind.arity();
    if self.stack.len() < needed {
      return Err(CompileError::StackUnderflow {
        index,
        op: op.kind,
        needed,
        available: self.stack.len(),
      });
    }

    match op.kind {
      OpKind::Push => self.stack.push(op.value),
      OpKind::Plus => {
        let a = self.pop();
        let b = self.pop();
        self.stack.push(b.wrapping_add(a));
      }
      OpKind::Minus => {
        let a = self.pop();
        let b = self.pop();
        self.stack.push(b.wrapping_sub(a));
      }
      OpKind::Dump => {
        // Same bits the native `dump` routine prints: unsigned decimal.
        let a = self.pop() as u64;
        writeln!(out, "{a}").context(OutputSnafu { action: "write" })?;
      }
    }
    Ok(())
  }

  // Callers check arity first, so the stack is never short here.
  fn pop(&mut self) -> i64 {
    self.stack.pop().unwrap_or_default()
  }
}

/// Simulate `program` on a fresh stack.
pub fn simulate<W: Write>(program: &Program, out: &mut W) -> CompileResult<()> {
  Simulator::new().run(program, out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse;
  use proptest::prelude::*;

  fn run_source(source: &str) -> CompileResult<String> {
    let program = parse(source)?;
    let mut out = Vec::new();
    simulate(&program, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
  }

  #[test]
  fn test_add_then_sub() {
    assert_eq!(run_source("16 32 + => 256 128 - =>").unwrap(), "48\n128\n");
  }

  #[test]
  fn test_single_dump() {
    assert_eq!(run_source("5 =>").unwrap(), "5\n");
  }

  #[test]
  fn test_minus_operand_order() {
    assert_eq!(run_source("10 3 - =>").unwrap(), "7\n");
    assert_eq!(
      run_source("3 10 - =>").unwrap(),
      "18446744073709551609\n"
    );
  }

  #[test]
  fn test_dump_consumes_value() {
    let program = parse("1 2 =>").unwrap();
    let mut sim = Simulator::new();
    let mut out = Vec::new();
    sim.run(&program, &mut out).unwrap();
    assert_eq!(sim.stack(), &[1]);
    assert_eq!(out, b"2\n");
  }

  #[test]
  fn test_plus_on_empty_stack_underflows_without_output() {
    let program = parse("+").unwrap();
    let mut out = Vec::new();
    let err = simulate(&program, &mut out).unwrap_err();
    assert!(matches!(
      err,
      CompileError::StackUnderflow {
        index: 0,
        op: OpKind::Plus,
        needed: 2,
        available: 0
      }
    ));
    assert!(out.is_empty());
  }

  #[test]
  fn test_output_before_underflow_is_kept() {
    let program = parse("7 => =>").unwrap();
    let mut out = Vec::new();
    let err = simulate(&program, &mut out).unwrap_err();
    assert!(matches!(err, CompileError::StackUnderflow { index: 2, .. }));
    assert_eq!(out, b"7\n");
  }

  #[test]
  fn test_negative_dump_prints_twos_complement() {
    assert_eq!(run_source("-1 =>").unwrap(), "18446744073709551615\n");
    assert_eq!(run_source("0 5 - =>").unwrap(), "18446744073709551611\n");
  }

  #[test]
  fn test_failing_sink_is_output_error() {
    struct Broken;

    impl Write for Broken {
      fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("closed"))
      }

      fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
      }
    }

    let err = simulate(&parse("1 =>").unwrap(), &mut Broken).unwrap_err();
    assert!(matches!(err, CompileError::Output { .. }));
    assert!(err.to_string().starts_with("could not write program output"));
  }

  #[test]
  fn test_arithmetic_wraps() {
    let source = format!("{} 1 + =>", i64::MAX);
    assert_eq!(run_source(&source).unwrap(), "9223372036854775808\n");
  }

  #[test]
  fn test_run_resets_stack() {
    let mut sim = Simulator::new();
    let mut out = Vec::new();
    sim.run(&parse("1 2 3").unwrap(), &mut out).unwrap();
    sim.run(&parse("4").unwrap(), &mut out).unwrap();
    assert_eq!(sim.stack(), &[4]);
  }

  proptest! {
    #[test]
    fn plus_and_minus_match_wrapping_arithmetic(a in any::<i64>(), b in any::<i64>()) {
      let program = Program::new(vec![
        Op::push(a), Op::push(b), Op::plus(), Op::dump(),
        Op::push(a), Op::push(b), Op::minus(), Op::dump(),
      ]);
      let mut out = Vec::new();
      simulate(&program, &mut out).unwrap();
      let sum = a.wrapping_add(b) as u64;
      let difference = a.wrapping_sub(b) as u64;
      let expected = format!("{sum}\n{difference}\n");
      prop_assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
  }
}
