use core::ast::{walk, AstArena, AstNodeKind, AstVisitor, BinOp, IfStmtNode, NodeIdx, TypeTag};
use core::errors::CompileTimeError;

/// Checks `if` conditions are `bool` and `listen` operands are `string`.
/// Reuses the AST visitor's event hooks (`on_after_if_condition`) directly
/// rather than re-walking the tree structurally — exactly the use case those
/// hooks exist for (`spec.md` §9's AST-polymorphism note).
#[derive(Default)]
pub struct TypeChecker {
  pub errors: Vec<CompileTimeError>,
}

impl AstVisitor for TypeChecker {
  fn on_after_if_condition(&mut self, arena: &AstArena, idx: NodeIdx) {
    if let AstNodeKind::IfStmt(IfStmtNode { condition, .. }) = &arena.get(idx).kind {
      let ty = infer_type(arena, *condition);
      if ty != TypeTag::Bool {
        crate::push_error(
          &mut self.errors,
          arena,
          *condition,
          format!("`if` condition must be a Boolean expression, got {}", ty.display_name()),
        );
      }
    }
  }

  fn visit_listen(&mut self, arena: &AstArena, _idx: NodeIdx, options: NodeIdx) {
    let ty = infer_type(arena, options);
    if ty != TypeTag::String {
      crate::push_error(
        &mut self.errors,
        arena,
        options,
        format!("`listen` operand must be a string expression, got {}", ty.display_name()),
      );
    }
    walk(self, arena, options);
  }
}

/// Computes the static type of an expression node, memoizing `Binary` nodes
/// in their own `Cell` (`spec.md` §4.3: "`Binary.type` memoized").
pub fn infer_type(arena: &AstArena, idx: NodeIdx) -> TypeTag {
  match &arena.get(idx).kind {
    AstNodeKind::BoolLiteral(_) => TypeTag::Bool,
    AstNodeKind::StringLiteral(_) => TypeTag::String,
    // The value a `listen` expression evaluates to once the VM resumes with
    // reader input is always the string the reader typed.
    AstNodeKind::Listen(_) => TypeTag::String,
    AstNodeKind::Binary(node) => {
      if let Some(cached) = node.ty.get() {
        return cached;
      }
      // `==`/`!=` are the only infix operators this revision of the grammar
      // has, and both produce `bool` (`spec.md` §3). A later arithmetic
      // operator would inherit the LHS type instead.
      let ty = match node.op {
        BinOp::Eq | BinOp::NotEq => TypeTag::Bool,
      };
      node.ty.set(Some(ty));
      ty
    }
    AstNodeKind::Curlies(inner) => infer_type(arena, *inner),
    _ => TypeTag::Invalid,
  }
}
