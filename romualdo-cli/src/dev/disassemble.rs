//! `dev disassemble <ras>`: a per-instruction disassembly listing, grounded
//! on `PLV/src/disassembler.rs`'s `{offset} {line} {OPCODE} {operand}`
//! column layout (repeated-line `|` marker standing in for its
//! max-width-padded columns, since this opcode set has no variable-width
//! hex/name columns worth padding for).

use std::fmt::Write as FmtWrite;
use std::path::Path;

use core::bytecode::OpCode;
use core::errors::RomualdoError;
use core::storyworld::{CompiledStoryworld, DebugInfo};

pub fn cmd_disassemble(ras_path: &Path) -> Result<(), RomualdoError> {
  let bytes = std::fs::read(ras_path).map_err(|e| RomualdoError::tool(format!("{}: {}", ras_path.display(), e)))?;
  let artifact = artifact::read_compiled_storyworld(&bytes)?;

  let rad_path = ras_path.with_extension("rad");
  let debug = match std::fs::read(&rad_path) {
    Ok(bytes) => artifact::read_debug_info(&bytes)?,
    Err(_) => DebugInfo::default(),
  };

  print!("{}", disassemble_all(&artifact, &debug));
  Ok(())
}

pub fn disassemble_all(artifact: &CompiledStoryworld, debug: &DebugInfo) -> String {
  let mut out = String::new();
  for (i, chunk) in artifact.chunks.iter().enumerate() {
    let name = debug.chunk_names.get(i).cloned().unwrap_or_else(|| format!("<chunk {}>", i));
    let marker = if artifact.initial_chunk == i as u32 { " (initial)" } else { "" };
    writeln!(out, "{} ------------{}", name, marker).unwrap();
    writeln!(out, "  hash: {}", hex(&chunk.hash)).unwrap();
    out.push_str(&disassemble_chunk(chunk, debug.chunk_lines.get(i)));
    out.push('\n');
  }
  out
}

fn disassemble_chunk(chunk: &core::chunk::Chunk, lines: Option<&Vec<u32>>) -> String {
  let mut out = String::new();
  let mut offset = 0usize;
  let mut prev_line: Option<u32> = None;

  while offset < chunk.len() {
    let line = lines.and_then(|l| l.get(offset)).copied();
    let line_col = match line {
      Some(line) if prev_line == Some(line) => "   |".to_string(),
      Some(line) => {
        prev_line = Some(line);
        format!("{:4}", line)
      }
      None => "   ?".to_string(),
    };

    let byte = chunk.code[offset];
    let opcode = match OpCode::try_from(byte) {
      Ok(op) => op,
      Err(bad) => {
        writeln!(out, "{:05} {} UNKNOWN({:#04x})", offset, line_col, bad).unwrap();
        offset += 1;
        continue;
      }
    };

    let operand_len = opcode.operand_len();
    let operand = if operand_len == 4 {
      format!(" {}", chunk.get_i32(offset + 1))
    } else {
      String::new()
    };

    writeln!(out, "{:05} {} {:<12}{}", offset, line_col, opcode_name(opcode), operand).unwrap();
    offset += 1 + operand_len;
  }

  out
}

fn opcode_name(op: OpCode) -> &'static str {
  match op {
    OpCode::Nop => "NOP",
    OpCode::Constant => "CONSTANT",
    OpCode::Say => "SAY",
    OpCode::Listen => "LISTEN",
    OpCode::Pop => "POP",
    OpCode::True => "TRUE",
    OpCode::False => "FALSE",
    OpCode::Jump => "JUMP",
    OpCode::JumpIfFalse => "JUMP_IF_FALSE",
    OpCode::Equal => "EQUAL",
    OpCode::NotEqual => "NOT_EQUAL",
    OpCode::ToString => "TO_STRING",
    OpCode::ToLecture => "TO_LECTURE",
  }
}

fn hex(bytes: &[u8; 32]) -> String {
  bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
