//! `dev scan <file>`: dumps the raw code-mode token stream of a source file,
//! one token per line. The scanner's lecture mode is parser-driven (`spec.md`
//! §4.1/§9), so a standalone scan never enters it — this is a debugging view
//! of the lexical layer alone, not a substitute for `dev print-ast`.

use std::path::Path;

use core::errors::RomualdoError;
use core::tokens::TokenKind;
use lexer::Lexer;

pub fn cmd_scan(path: &Path) -> Result<(), RomualdoError> {
  let text = std::fs::read_to_string(path).map_err(|e| RomualdoError::tool(format!("{}: {}", path.display(), e)))?;
  let chars: Vec<char> = text.chars().collect();

  let mut lexer = Lexer::new(&chars);
  loop {
    let tok = lexer.next_token();
    let lexeme: String = match &tok.kind {
      TokenKind::Lecture(text) => text.clone(),
      TokenKind::Error(msg) => msg.clone(),
      _ => chars[tok.span.0..tok.span.1].iter().collect(),
    };
    let backslash = if tok.backslashed { "\\" } else { "" };
    println!("{:4} {:?}{} {:?}", tok.line, tok.kind, backslash, lexeme);

    if tok.is_eof() || tok.is_error() {
      break;
    }
  }

  Ok(())
}
