use crate::objects::{AstFuncObj, Value};
use hashbrown::HashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Represents a Lox class: a name, an optional superclass, and the method
/// table declared in the class body.
pub struct ClassObject {
  pub name: String,
  pub superclass: Option<Rc<RefCell<ClassObject>>>,
  pub methods: HashMap<String, Rc<AstFuncObj>>,
}

impl ClassObject {
  /// Looks up a method by name on this class, walking the inheritance
  /// chain when the class itself does not declare it.
  pub fn find_method(&self, name: &str) -> Option<Rc<AstFuncObj>> {
    if let Some(method) = self.methods.get(name) {
      return Some(Rc::clone(method));
    }

    match &self.superclass {
      Some(superclass) => superclass.borrow().find_method(name),
      None => None,
    }
  }
}

/// Represents an instance of a Lox class, with its own field storage.
pub struct InstanceObject {
  pub class: Rc<RefCell<ClassObject>>,
  pub fields: HashMap<String, Value>,
}

/// Represents a method bound to the instance it was accessed through.
#[derive(Clone)]
pub struct BoundMethodObj {
  pub receiver: Rc<RefCell<InstanceObject>>,
  pub method: Rc<AstFuncObj>,
}
