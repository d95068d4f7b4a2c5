//! The `romualdo` command-line dispatcher. Grounded on the teacher's own
//! `Hinton/src/main.rs`: a bare `env::args()` match, no `clap` anywhere in
//! the dependency graph.

mod build;
mod dev;
mod report;
mod run;

use std::env;
use std::path::PathBuf;

use core::errors::RomualdoError;

fn main() {
  let args: Vec<String> = env::args().collect();
  let code = match dispatch(&args) {
    Ok(()) => 0,
    Err(err) => report::report(&err),
  };
  std::process::exit(code);
}

fn dispatch(args: &[String]) -> Result<(), RomualdoError> {
  match args {
    [_] => Err(RomualdoError::BadUsage(usage())),
    [_, cmd, dir] if cmd == "build" => build::cmd_build(&PathBuf::from(dir)),
    [_, cmd, target] if cmd == "run" => run::cmd_run(&PathBuf::from(target)),
    [_, cmd, rest @ ..] if cmd == "dev" => dev::dispatch(rest),
    [_, other, ..] => Err(RomualdoError::BadUsage(format!("unknown command `{}`\n{}", other, usage()))),
    [] => Err(RomualdoError::BadUsage(usage())),
  }
}

fn usage() -> String {
  "usage:\n  \
   romualdo build <dir>\n  \
   romualdo run <dir-or-ras>\n  \
   romualdo dev print-ast <file>\n  \
   romualdo dev scan <file>\n  \
   romualdo dev disassemble <ras>\n  \
   romualdo dev hash <file> [--symbol NAME]\n  \
   romualdo dev test --suite <dir> [--walk-dont-run]"
    .to_string()
}
