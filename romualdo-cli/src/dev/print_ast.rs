//! `dev print-ast <file>`: parses a single source file and dumps its AST as
//! an indented tree, for inspecting what the parser actually built.

use std::path::Path;

use core::ast::{AstArena, AstNodeKind, NodeIdx};
use core::errors::RomualdoError;

pub fn cmd_print_ast(path: &Path) -> Result<(), RomualdoError> {
  let text = std::fs::read_to_string(path).map_err(|e| RomualdoError::tool(format!("{}: {}", path.display(), e)))?;
  let chars: Vec<char> = text.chars().collect();
  let source_file: std::sync::Arc<str> = std::sync::Arc::from(path.to_string_lossy().as_ref());

  let (arena, root, errors) = parser::parse(&chars, source_file, std::sync::Arc::from("/"));
  if !errors.is_empty() {
    return Err(core::errors::merge_compile_errors(errors.into_iter().map(core::errors::RomualdoError::CompileTime).collect()));
  }

  print_node(&arena, root, 0);
  Ok(())
}

fn print_node(arena: &AstArena, idx: NodeIdx, depth: usize) {
  let node = arena.get(idx);
  let indent = "  ".repeat(depth);

  match &node.kind {
    AstNodeKind::Storyworld(children) => {
      println!("{}Storyworld", indent);
      for &c in children {
        print_node(arena, c, depth + 1);
      }
    }
    AstNodeKind::SourceFile(children) => {
      println!("{}SourceFile ({} decls)", indent, children.len());
      for &c in children {
        print_node(arena, c, depth + 1);
      }
    }
    AstNodeKind::ProcedureDecl(proc) => {
      let kind = if matches!(proc.kind, core::ast::ProcedureKind::Function) { "function" } else { "passage" };
      let params: Vec<String> = proc.params.iter().map(|p| format!("{}: {}", p.name, p.type_tag.display_name())).collect();
      println!(
        "{}ProcedureDecl {} {}{}({}) : {} [line {}]",
        indent,
        kind,
        proc.package,
        proc.name,
        params.join(", "),
        proc.return_type.display_name(),
        node.line
      );
      print_node(arena, proc.body, depth + 1);
    }
    AstNodeKind::Block(block) => {
      println!("{}Block", indent);
      for &s in &block.statements {
        print_node(arena, s, depth + 1);
      }
    }
    AstNodeKind::IfStmt(if_stmt) => {
      println!("{}IfStmt [line {}]", indent, node.line);
      println!("{}  condition:", indent);
      print_node(arena, if_stmt.condition, depth + 2);
      println!("{}  then:", indent);
      print_node(arena, if_stmt.then_block, depth + 2);
      match &if_stmt.else_branch {
        Some(core::ast::ElseBranch::Block(b)) => {
          println!("{}  else:", indent);
          print_node(arena, *b, depth + 2);
        }
        Some(core::ast::ElseBranch::ElseIf(i)) => {
          println!("{}  elseif:", indent);
          print_node(arena, *i, depth + 2);
        }
        None => {}
      }
    }
    AstNodeKind::ExpressionStmt(expr) => {
      println!("{}ExpressionStmt", indent);
      print_node(arena, *expr, depth + 1);
    }
    AstNodeKind::Say(body) => {
      println!("{}Say", indent);
      print_node(arena, *body, depth + 1);
    }
    AstNodeKind::Lecture(text) => {
      println!("{}Lecture {:?}", indent, text);
    }
    AstNodeKind::Listen(options) => {
      println!("{}Listen", indent);
      print_node(arena, *options, depth + 1);
    }
    AstNodeKind::BoolLiteral(value) => {
      println!("{}BoolLiteral {}", indent, value);
    }
    AstNodeKind::StringLiteral(value) => {
      println!("{}StringLiteral {:?}", indent, value);
    }
    AstNodeKind::Binary(bin) => {
      println!("{}Binary {}", indent, bin.op.lexeme());
      print_node(arena, bin.lhs, depth + 1);
      print_node(arena, bin.rhs, depth + 1);
    }
    AstNodeKind::Curlies(inner) => {
      println!("{}Curlies", indent);
      print_node(arena, *inner, depth + 1);
    }
  }
}
