use crate::ast::*;
use crate::objects::class_obj::ClassObject;
use crate::objects::{AstFuncObj, Value};
use crate::tree_walker::environment::Environment;
use crate::tree_walker::{runtime_error, EarlyExit, Interpreter};
use hashbrown::HashMap;
use std::cell::RefCell;
use std::rc::Rc;

impl Interpreter {
  /// Executes a single statement or declaration.
  pub(super) fn execute(&mut self, node: &ASTNode) -> Result<(), EarlyExit> {
    match node {
      ASTNode::ExpressionStmt(stmt) => {
        self.evaluate(&stmt.child)?;
        Ok(())
      }

      ASTNode::PrintStmt(stmt) => {
        let value = self.evaluate(&stmt.child)?;
        println!("{}", value);
        Ok(())
      }

      ASTNode::VarDecl(decl) => {
        let value = match &decl.initializer {
          Some(initializer) => self.evaluate(initializer)?,
          None => Value::Nil,
        };

        self.environment.borrow_mut().define(&decl.name.lexeme, value);
        Ok(())
      }

      ASTNode::Block(block) => {
        let env = Environment::with_enclosing(Rc::clone(&self.environment));
        self.execute_block(&block.body, Rc::new(RefCell::new(env)))
      }

      ASTNode::IfStmt(stmt) => {
        if !self.evaluate(&stmt.condition)?.is_falsey() {
          self.execute(&stmt.then_branch)
        } else if let Some(else_branch) = &stmt.else_branch {
          self.execute(else_branch)
        } else {
          Ok(())
        }
      }

      ASTNode::WhileStmt(stmt) => {
        while !self.evaluate(&stmt.condition)?.is_falsey() {
          self.execute(&stmt.body)?;
        }
        Ok(())
      }

      ASTNode::FunctionDecl(decl) => {
        let function = Value::AstFunction(Rc::new(AstFuncObj {
          decl: Rc::clone(decl),
          closure: Rc::clone(&self.environment),
          is_initializer: false,
        }));

        self.environment.borrow_mut().define(&decl.name.lexeme, function);
        Ok(())
      }

      ASTNode::ReturnStmt(stmt) => {
        let value = match &stmt.value {
          Some(value) => self.evaluate(value)?,
          None => Value::Nil,
        };

        Err(EarlyExit::Return(value))
      }

      ASTNode::ClassDecl(decl) => self.execute_class_decl(decl),

      // Expressions in statement position only occur inside the nodes
      // above, so evaluating here covers stray cases uniformly.
      _ => {
        self.evaluate(node)?;
        Ok(())
      }
    }
  }

  /// Executes a class declaration: evaluates the superclass, builds the
  /// method table (with `super` in scope when inheriting), and binds the
  /// class object to its name.
  fn execute_class_decl(&mut self, decl: &ClassDeclNode) -> Result<(), EarlyExit> {
    let superclass = match &decl.superclass {
      Some(superclass) => {
        let value = self.look_up_variable(
          &superclass.name.lexeme,
          superclass.depth.get(),
          superclass.name.line_num,
        )?;

        match value {
          Value::Class(class) => Some(class),
          _ => {
            return Err(runtime_error(
              String::from("Superclass must be a class."),
              superclass.name.line_num,
            ));
          }
        }
      }
      None => None,
    };

    self.environment.borrow_mut().define(&decl.name.lexeme, Value::Nil);

    // When inheriting, methods close over an extra scope that holds the
    // superclass under the name `super`.
    let method_closure = match &superclass {
      Some(superclass) => {
        let mut super_env = Environment::with_enclosing(Rc::clone(&self.environment));
        super_env.define("super", Value::Class(Rc::clone(superclass)));
        Rc::new(RefCell::new(super_env))
      }
      None => Rc::clone(&self.environment),
    };

    let mut methods: HashMap<String, Rc<AstFuncObj>> = HashMap::new();
    for method in &decl.methods {
      let function = AstFuncObj {
        decl: Rc::clone(method),
        closure: Rc::clone(&method_closure),
        is_initializer: method.name.lexeme == "init",
      };

      methods.insert(method.name.lexeme.clone(), Rc::new(function));
    }

    let class = Value::Class(Rc::new(RefCell::new(ClassObject {
      name: decl.name.lexeme.clone(),
      superclass,
      methods,
    })));

    self.environment.borrow_mut().assign_here(&decl.name.lexeme, class);
    Ok(())
  }
}
