//! `dev *` subcommands: developer-facing inspection tools that sit outside
//! the `build`/`run` user surface (`spec.md` §6).

mod disassemble;
mod hash;
mod print_ast;
mod scan;
mod test_suite;

use std::path::PathBuf;

use core::errors::RomualdoError;

pub fn dispatch(args: &[String]) -> Result<(), RomualdoError> {
  match args {
    [sub, file] if sub == "print-ast" => print_ast::cmd_print_ast(&PathBuf::from(file)),
    [sub, file] if sub == "scan" => scan::cmd_scan(&PathBuf::from(file)),
    [sub, ras] if sub == "disassemble" => disassemble::cmd_disassemble(&PathBuf::from(ras)),
    [sub, file] if sub == "hash" => hash::cmd_hash(&PathBuf::from(file), None),
    [sub, file, flag, name] if sub == "hash" && flag == "--symbol" => hash::cmd_hash(&PathBuf::from(file), Some(name)),
    [sub, flag, dir] if sub == "test" && flag == "--suite" => test_suite::cmd_test(&PathBuf::from(dir), false),
    [sub, flag, dir, walk] if sub == "test" && flag == "--suite" && walk == "--walk-dont-run" => {
      test_suite::cmd_test(&PathBuf::from(dir), true)
    }
    [sub, ..] => Err(RomualdoError::BadUsage(format!("unknown `dev` subcommand `{}`", sub))),
    [] => Err(RomualdoError::BadUsage("expected a `dev` subcommand".to_string())),
  }
}
