//! Operation model shared by the parser and both backends.
//!
//! The opcode set is a closed enum. `COUNT_OPS` is the number of opcodes the
//! rest of the toolchain was written against. The const block below breaks
//! the build when `OpKind::ALL` drifts from it, and [`check_op_count`] lets
//! the parser verify its own table before it reads any input.

use std::fmt;

use crate::error::{CompileError, CompileResult};

/// Number of opcodes every consumer of the model is expected to handle.
pub const COUNT_OPS: usize = 4;

/// Tag identifying what an [`Op`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
  Push,
  Plus,
  Minus,
  Dump,
}

impl OpKind {
  /// Every opcode, in declaration order.
  pub const ALL: &'static [OpKind] = &[OpKind::Push, OpKind::Plus, OpKind::Minus, OpKind::Dump];

  /// Position in [`OpKind::ALL`].
  pub const fn ordinal(self) -> usize {
    match self {
      OpKind::Push => 0,
      OpKind::Plus => 1,
      OpKind::Minus => 2,
      OpKind::Dump => 3,
    }
  }

  /// Operands consumed from the stack.
  pub fn arity(self) -> usize {
    match self {
      OpKind::Push => 0,
      OpKind::Plus | OpKind::Minus => 2,
      OpKind::Dump => 1,
    }
  }

  /// Values left on the stack afterwards.
  pub fn yields(self) -> usize {
    match self {
      OpKind::Push | OpKind::Plus | OpKind::Minus => 1,
      OpKind::Dump => 0,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      OpKind::Push => "push",
      OpKind::Plus => "plus",
      OpKind::Minus => "minus",
      OpKind::Dump => "dump",
    }
  }
}

impl fmt::Display for OpKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

const _: () = {
  assert!(OpKind::ALL.len() == COUNT_OPS);
  let mut i = 0;
  while i < COUNT_OPS {
    assert!(OpKind::ALL[i].ordinal() == i);
    i += 1;
  }
};

/// A single instruction. `value` is only meaningful for `Push`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op {
  pub kind: OpKind,
  pub value: i64,
}

impl Op {
  pub const fn push(value: i64) -> Self {
    Self {
      kind: OpKind::Push,
      value,
    }
  }

  pub const fn plus() -> Self {
    Self {
      kind: OpKind::Plus,
      value: 0,
    }
  }

  pub const fn minus() -> Self {
    Self {
      kind: OpKind::Minus,
      value: 0,
    }
  }

  pub const fn dump() -> Self {
    Self {
      kind: OpKind::Dump,
      value: 0,
    }
  }
}

/// Ordered operation sequence produced by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  ops: Vec<Op>,
}

impl Program {
  pub fn new(ops: Vec<Op>) -> Self {
    Self { ops }
  }

  pub fn ops(&self) -> &[Op] {
    &self.ops
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Op> {
    self.ops.iter()
  }

  pub fn len(&self) -> usize {
    self.ops.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  /// Walk the program's stack effect without executing it.
  ///
  /// With no control flow the depth at every position is known statically,
  /// so this reports exactly the underflow the simulator would hit.
  pub fn check_stack(&self) -> CompileResult<()> {
    let mut depth = 0usize;
    for (index, op) in self.ops.iter().enumerate() {
      let needed = op.kind.arity();
      if depth < needed {
        return Err(CompileError::StackUnderflow {
          index,
          op: op.kind,
          needed,
          available: depth,
        });
      }
      depth = depth - needed + op.kind.yields();
    }
    Ok(())
  }
}

impl FromIterator<Op> for Program {
  fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

impl<'a> IntoIterator for &'a Program {
  type Item = &'a Op;
  type IntoIter = std::slice::Iter<'a, Op>;

  fn into_iter(self) -> Self::IntoIter {
    self.ops.iter()
  }
}

/// Fail when a consumer handles a different number of opcodes than the model defines.
pub fn check_op_count(handled: usize) -> CompileResult<()> {
  if handled != COUNT_OPS {
    return Err(CompileError::OpcodeCount {
      defined: COUNT_OPS,
      handled,
    });
  }
  Ok(())
}
