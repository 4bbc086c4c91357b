//! Hand a generated listing to the external assembler and linker.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use snafu::ResultExt;

use crate::codegen::Listing;
use crate::error::{CompileError, CompileResult, IoSnafu, ToolSpawnSnafu};

/// External programs used to turn a listing into an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  pub assembler: String,
  pub linker: String,
}

impl Default for Toolchain {
  fn default() -> Self {
    Self {
      assembler: "nasm".to_string(),
      linker: "ld".to_string(),
    }
  }
}

/// Paths derived from an artifact base name: `<base>.asm`, `<base>.o`, `<base>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
  pub asm: PathBuf,
  pub object: PathBuf,
  pub binary: PathBuf,
}

impl Artifacts {
  pub fn new(base: impl AsRef<Path>) -> Self {
    let base = base.as_ref();
    Self {
      asm: with_suffix(base, ".asm"),
      object: with_suffix(base, ".o"),
      binary: base.to_path_buf(),
    }
  }
}

// Appends rather than replaces, so dots in the base name survive.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
  let mut name = base.as_os_str().to_os_string();
  name.push(suffix);
  PathBuf::from(name)
}

impl Toolchain {
  /// `nasm -felf64 <asm> -o <object>`
  pub fn assemble_command(&self, artifacts: &Artifacts) -> Command {
    let mut cmd = Command::new(&self.assembler);
    cmd
      .arg("-felf64")
      .arg(&artifacts.asm)
      .arg("-o")
      .arg(&artifacts.object);
    cmd
  }

  /// `ld -o <binary> <object>`
  pub fn link_command(&self, artifacts: &Artifacts) -> Command {
    let mut cmd = Command::new(&self.linker);
    cmd.arg("-o").arg(&artifacts.binary).arg(&artifacts.object);
    cmd
  }

  /// Assemble and link an already written listing.
  pub fn build(&self, artifacts: &Artifacts) -> CompileResult<()> {
    run(self.assemble_command(artifacts))?;
    run(self.link_command(artifacts))
  }
}

/// Write `listing` to `path`. The file handle is closed on every return path.
pub fn write_listing(listing: &Listing, path: &Path) -> CompileResult<()> {
  let file = File::create(path).context(IoSnafu {
    action: "create",
    path,
  })?;
  let mut out = BufWriter::new(file);
  listing
    .write_to(&mut out)
    .and_then(|()| out.flush())
    .context(IoSnafu {
      action: "write",
      path,
    })?;
  log::info!("wrote {}", path.display());
  Ok(())
}

/// Render a command the way it would be typed in a shell.
pub fn describe(cmd: &Command) -> String {
  std::iter::once(cmd.get_program())
    .chain(cmd.get_args())
    .map(|part| part.to_string_lossy().into_owned())
    .collect::<Vec<_>>()
    .join(" ")
}

fn run(mut cmd: Command) -> CompileResult<()> {
  let command = describe(&cmd);
  log::info!("running {command}");
  let status = cmd
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .status()
    .context(ToolSpawnSnafu {
      command: command.as_str(),
    })?;
  if !status.success() {
    return Err(CompileError::ToolFailed { command, status });
  }
  Ok(())
}
