use crate::ast::*;
use crate::errors::{error_report_at_token, ErrorReport};
use crate::lexer::tokens::Token;
use hashbrown::HashMap;
use std::cell::Cell;

/// The kind of function the resolver is currently inside of.
#[derive(Clone, Copy, PartialEq)]
enum FunctionCtx {
  None,
  Function,
  Initializer,
  Method,
}

/// The kind of class the resolver is currently inside of.
#[derive(Clone, Copy, PartialEq)]
enum ClassCtx {
  None,
  Class,
  Subclass,
}

/// The static resolver for the tree-walking back-end. It walks the AST
/// with a stack of scope maps, enforces the declare-then-define discipline,
/// and annotates every variable use with the environment depth of its
/// declaration. Names that resolve to no scope are left global.
pub struct Resolver {
  /// Each scope maps a declared name to whether its initializer has
  /// finished resolving.
  scopes: Vec<HashMap<String, bool>>,
  current_function: FunctionCtx,
  current_class: ClassCtx,
  errors: Vec<ErrorReport>,
}

impl Resolver {
  /// Resolves a whole program.
  ///
  /// # Returns
  /// - `Err(Vec<ErrorReport>)`: The list of resolution errors, if any.
  pub fn resolve(program: &[ASTNode]) -> Result<(), Vec<ErrorReport>> {
    let mut resolver = Resolver {
      scopes: vec![],
      current_function: FunctionCtx::None,
      current_class: ClassCtx::None,
      errors: vec![],
    };

    for node in program {
      resolver.resolve_node(node);
    }

    if resolver.errors.is_empty() {
      Ok(())
    } else {
      Err(resolver.errors)
    }
  }

  fn error_at_token(&mut self, token: &Token, message: &str) {
    self.errors.push(error_report_at_token(token, message));
  }

  fn begin_scope(&mut self) {
    self.scopes.push(HashMap::new());
  }

  fn end_scope(&mut self) {
    self.scopes.pop();
  }

  /// Declares a name in the current scope without marking it defined, so
  /// that its own initializer cannot read it.
  fn declare(&mut self, name: &Token) {
    if let Some(scope) = self.scopes.last_mut() {
      if scope.contains_key(&name.lexeme) {
        self.error_at_token(name, "Already a variable with this name in this scope.");
        return;
      }

      scope.insert(name.lexeme.clone(), false);
    }
  }

  /// Marks a declared name as fully defined.
  fn define(&mut self, name: &Token) {
    if let Some(scope) = self.scopes.last_mut() {
      scope.insert(name.lexeme.clone(), true);
    }
  }

  /// Annotates a variable use with the number of scopes between the use
  /// and the declaration. Unresolved names stay global.
  fn resolve_variable(&mut self, name: &Token, depth: &Cell<Option<usize>>) {
    for (idx, scope) in self.scopes.iter().enumerate().rev() {
      if scope.contains_key(&name.lexeme) {
        depth.set(Some(self.scopes.len() - 1 - idx));
        return;
      }
    }
  }

  fn resolve_node(&mut self, node: &ASTNode) {
    match node {
      ASTNode::Literal(_) => {}

      ASTNode::Unary(expr) => self.resolve_node(&expr.operand),

      ASTNode::Binary(expr) => {
        self.resolve_node(&expr.left);
        self.resolve_node(&expr.right);
      }

      ASTNode::Logical(expr) => {
        self.resolve_node(&expr.left);
        self.resolve_node(&expr.right);
      }

      ASTNode::Variable(expr) => {
        if let Some(scope) = self.scopes.last() {
          if let Some(false) = scope.get(&expr.name.lexeme) {
            self.error_at_token(&expr.name, "Can't read local variable in its own initializer.");
          }
        }

        self.resolve_variable(&expr.name, &expr.depth);
      }

      ASTNode::Assignment(expr) => {
        self.resolve_node(&expr.value);
        self.resolve_variable(&expr.name, &expr.depth);
      }

      ASTNode::Call(expr) => {
        self.resolve_node(&expr.callee);
        for argument in &expr.arguments {
          self.resolve_node(argument);
        }
      }

      ASTNode::PropGet(expr) => self.resolve_node(&expr.object),

      ASTNode::PropSet(expr) => {
        self.resolve_node(&expr.value);
        self.resolve_node(&expr.object);
      }

      ASTNode::This(expr) => {
        if self.current_class == ClassCtx::None {
          self.error_at_token(&expr.keyword, "Can't use 'this' outside of a class.");
          return;
        }

        self.resolve_variable(&expr.keyword, &expr.depth);
      }

      ASTNode::Super(expr) => {
        match self.current_class {
          ClassCtx::None => {
            self.error_at_token(&expr.keyword, "Can't use 'super' outside of a class.");
            return;
          }
          ClassCtx::Class => {
            self.error_at_token(&expr.keyword, "Can't use 'super' in a class with no superclass.");
            return;
          }
          ClassCtx::Subclass => {}
        }

        self.resolve_variable(&expr.keyword, &expr.depth);
      }

      ASTNode::ExpressionStmt(stmt) => self.resolve_node(&stmt.child),
      ASTNode::PrintStmt(stmt) => self.resolve_node(&stmt.child),

      ASTNode::VarDecl(decl) => {
        self.declare(&decl.name);
        if let Some(initializer) = &decl.initializer {
          self.resolve_node(initializer);
        }
        self.define(&decl.name);
      }

      ASTNode::Block(block) => {
        self.begin_scope();
        for node in &block.body {
          self.resolve_node(node);
        }
        self.end_scope();
      }

      ASTNode::IfStmt(stmt) => {
        self.resolve_node(&stmt.condition);
        self.resolve_node(&stmt.then_branch);
        if let Some(else_branch) = &stmt.else_branch {
          self.resolve_node(else_branch);
        }
      }

      ASTNode::WhileStmt(stmt) => {
        self.resolve_node(&stmt.condition);
        self.resolve_node(&stmt.body);
      }

      ASTNode::FunctionDecl(decl) => {
        // Define the name before resolving the body so the function can
        // refer to itself recursively.
        self.declare(&decl.name);
        self.define(&decl.name);

        self.resolve_function(decl, FunctionCtx::Function);
      }

      ASTNode::ReturnStmt(stmt) => {
        if self.current_function == FunctionCtx::None {
          self.error_at_token(&stmt.keyword, "Can't return from top-level code.");
        }

        if let Some(value) = &stmt.value {
          if self.current_function == FunctionCtx::Initializer {
            self.error_at_token(&stmt.keyword, "Can't return a value from an initializer.");
          }

          self.resolve_node(value);
        }
      }

      ASTNode::ClassDecl(decl) => self.resolve_class(decl),
    }
  }

  /// Resolves a function or method body inside its own scope.
  fn resolve_function(&mut self, decl: &FunctionDeclNode, ctx: FunctionCtx) {
    let enclosing = std::mem::replace(&mut self.current_function, ctx);

    self.begin_scope();
    for param in &decl.params {
      self.declare(param);
      self.define(param);
    }
    for node in &decl.body {
      self.resolve_node(node);
    }
    self.end_scope();

    self.current_function = enclosing;
  }

  /// Resolves a class declaration: the superclass reference, the implicit
  /// `super` and `this` scopes, and each method body.
  fn resolve_class(&mut self, decl: &ClassDeclNode) {
    let enclosing = std::mem::replace(&mut self.current_class, ClassCtx::Class);

    self.declare(&decl.name);
    self.define(&decl.name);

    if let Some(superclass) = &decl.superclass {
      if superclass.name.lexeme == decl.name.lexeme {
        self.error_at_token(&superclass.name, "A class can't inherit from itself.");
      }

      self.current_class = ClassCtx::Subclass;
      self.resolve_variable(&superclass.name, &superclass.depth);

      self.begin_scope();
      self.scopes.last_mut().unwrap().insert(String::from("super"), true);
    }

    self.begin_scope();
    self.scopes.last_mut().unwrap().insert(String::from("this"), true);

    for method in &decl.methods {
      let ctx = if method.name.lexeme == "init" {
        FunctionCtx::Initializer
      } else {
        FunctionCtx::Method
      };

      self.resolve_function(method, ctx);
    }

    self.end_scope();

    if decl.superclass.is_some() {
      self.end_scope();
    }

    self.current_class = enclosing;
  }
}
