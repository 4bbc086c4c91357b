//! Assemble, link and run generated programs, comparing against the simulator.
//!
//! Needs `nasm` and `ld` on the PATH; the tests return early without them.
#![cfg(all(target_os = "linux", target_arch = "x86_64"))]

use std::process::{Command, Stdio};
use std::sync::OnceLock;

use proptest::prelude::*;
use skorpio::toolchain::{Artifacts, Toolchain, write_listing};
use skorpio::{Op, Program, codegen, parser, simulator};
use tempfile::tempdir;

fn tool_available(name: &str) -> bool {
  Command::new(name)
    .arg("--version")
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .is_ok()
}

fn tools_available() -> bool {
  static AVAILABLE: OnceLock<bool> = OnceLock::new();
  *AVAILABLE.get_or_init(|| {
    let found = tool_available("nasm") && tool_available("ld");
    if !found {
      eprintln!("skipping: nasm/ld not found");
    }
    found
  })
}

fn native_output(program: &Program) -> String {
  let dir = tempdir().unwrap();
  let artifacts = Artifacts::new(dir.path().join("prog"));
  let listing = codegen::generate(program).unwrap();
  write_listing(&listing, &artifacts.asm).unwrap();
  Toolchain::default().build(&artifacts).unwrap();

  let output = Command::new(&artifacts.binary).output().unwrap();
  assert!(output.status.success());
  String::from_utf8(output.stdout).unwrap()
}

fn simulated_output(program: &Program) -> String {
  let mut out = Vec::new();
  simulator::simulate(program, &mut out).unwrap();
  String::from_utf8(out).unwrap()
}

/// Turn arbitrary steps into a program that never underflows, dumping
/// whatever is left on the stack at the end.
fn balanced_program(steps: &[(u8, i64)]) -> Program {
  let mut ops = Vec::new();
  let mut depth = 0usize;
  for &(choice, value) in steps {
    let op = match choice % 4 {
      1 if depth >= 2 => Op::plus(),
      2 if depth >= 2 => Op::minus(),
      3 if depth >= 1 => Op::dump(),
      _ => Op::push(value),
    };
    depth = depth - op.kind.arity() + op.kind.yields();
    ops.push(op);
  }
  ops.extend(std::iter::repeat_n(Op::dump(), depth));
  Program::new(ops)
}

#[test]
fn test_native_matches_simulator() {
  if !tools_available() {
    return;
  }

  let sources = [
    "16 32 + => 256 128 - =>",
    "5 =>",
    "0 =>",
    "3 10 - =>",
    "-1 =>",
    "1000000 2345678 + 9 - =>",
    "3000000000 1 + =>",
    "9223372036854775807 1 + =>",
    "1 2 3 4 + + + => 10 =>",
    "",
  ];
  for source in sources {
    let program = parser::parse(source).unwrap();
    assert_eq!(
      native_output(&program),
      simulated_output(&program),
      "source: {source:?}"
    );
  }
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(32))]

  #[test]
  fn balanced_programs_agree_across_backends(
    steps in prop::collection::vec(
      (any::<u8>(), prop_oneof![any::<i64>(), -1000i64..1000]),
      0..40,
    )
  ) {
    if !tools_available() {
      return Ok(());
    }
    let program = balanced_program(&steps);
    prop_assert_eq!(native_output(&program), simulated_output(&program));
  }
}
