use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser};

use skorpio::toolchain::{Artifacts, Toolchain, write_listing};
use skorpio::{CompileResult, codegen, load_program, simulator};

#[derive(Parser, Debug)]
#[command(name = "skorpio", version, about = "Simulate or compile a stack program")]
#[command(group(ArgGroup::new("mode").required(true).args(["simulate", "compile"])))]
struct Cli {
  /// Simulate the program
  #[arg(short = 's', long, value_name = "FILE")]
  simulate: Option<PathBuf>,

  /// Compile the program to a native executable
  #[arg(short = 'c', long, value_name = "FILE")]
  compile: Option<PathBuf>,

  /// Base name of the generated artifacts
  #[arg(short = 'o', long, value_name = "NAME", default_value = "skorpio")]
  output: PathBuf,

  /// Assembler invoked on the generated listing
  #[arg(long, value_name = "PROG", default_value = "nasm")]
  assembler: String,

  /// Linker invoked on the assembled object
  #[arg(long, value_name = "PROG", default_value = "ld")]
  linker: String,

  /// Stop after writing the assembly listing
  #[arg(long)]
  emit_asm_only: bool,
}

fn compile(cli: &Cli, path: &Path) -> CompileResult<()> {
  let program = load_program(path)?;
  let listing = codegen::generate(&program)?;
  let artifacts = Artifacts::new(&cli.output);
  write_listing(&listing, &artifacts.asm)?;
  if cli.emit_asm_only {
    return Ok(());
  }

  let toolchain = Toolchain {
    assembler: cli.assembler.clone(),
    linker: cli.linker.clone(),
  };
  toolchain.build(&artifacts)?;
  log::info!("built {}", artifacts.binary.display());
  Ok(())
}

fn run(cli: &Cli) -> CompileResult<()> {
  if let Some(path) = &cli.simulate {
    let program = load_program(path)?;
    return simulator::simulate(&program, &mut io::stdout().lock());
  }
  match &cli.compile {
    Some(path) => compile(cli, path),
    None => Ok(()),
  }
}

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();

  match run(&cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("error: {err}");
      ExitCode::from(err.exit_code())
    }
  }
}
