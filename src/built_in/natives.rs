use crate::built_in::NativeFn;
use crate::objects::{NativeFuncObj, Value};
use hashbrown::{hash_map, HashMap};
use std::rc::Rc;
use std::time::SystemTime;

/// Represents the list of native functions available to a Lox program.
/// Both back-ends seed their globals from this table before execution.
pub struct Natives(HashMap<String, Rc<NativeFuncObj>>);

/// The default implementation of a native function list.
impl Default for Natives {
  fn default() -> Self {
    let mut natives = Natives(HashMap::new());

    // >>>>>>>>>>>>>>>> Native functions to be added after this line
    natives.add_native_function("clock", 0, native_clock as NativeFn);
    natives.add_native_function("random", 0, native_random as NativeFn);
    // <<<<<<<<<<<<<<<< Native functions to be added before this line

    natives
  }
}

impl Natives {
  /// Adds a native function definition to the native functions list.
  fn add_native_function(&mut self, name: &str, arity: u8, body: NativeFn) {
    let name = String::from(name);

    if let hash_map::Entry::Vacant(e) = self.0.entry(name.clone()) {
      e.insert(Rc::new(NativeFuncObj { name, arity, body }));
    } else {
      panic!("Cannot duplicate native function '{}'.", name);
    }
  }

  /// Iterates over the native function bindings so that a back-end can
  /// seed its globals table.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<NativeFuncObj>)> {
    self.0.values().map(|obj| (obj.name.as_str(), obj))
  }
}

/// Implements the `clock()` native function, which returns the number of
/// seconds since the Unix epoch. Monotonic within a single run.
fn native_clock(_: Vec<Value>) -> Result<Value, String> {
  match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
    Ok(t) => Ok(Value::Number(t.as_secs_f64())),
    Err(_) => Err(String::from("System's time before Unix epoch.")),
  }
}

/// Implements the `random()` native function, which computes a random
/// number in the interval [0, 1).
fn native_random(_: Vec<Value>) -> Result<Value, String> {
  Ok(Value::Number(rand::random()))
}
