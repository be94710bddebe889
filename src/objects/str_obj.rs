use hashbrown::HashSet;
use std::rc::Rc;

/// A content-addressed table from string contents to a single shared
/// handle. Insertion is idempotent: interning the same spelling twice
/// yields the same `Rc<str>`, so two interned string values are equal
/// exactly when their handles are identical.
#[derive(Default)]
pub struct StringInterner {
  strings: HashSet<Rc<str>>,
}

impl StringInterner {
  /// Creates an empty interner.
  pub fn new() -> Self {
    Self {
      strings: HashSet::new(),
    }
  }

  /// Interns a string, returning the canonical handle for its contents.
  /// On a hit the existing handle is reused; on a miss the bytes are
  /// copied into interner-owned storage first.
  pub fn intern(&mut self, s: &str) -> Rc<str> {
    if let Some(existing) = self.strings.get(s) {
      return Rc::clone(existing);
    }

    let handle: Rc<str> = Rc::from(s);
    self.strings.insert(Rc::clone(&handle));
    handle
  }

  /// The number of distinct strings interned so far.
  pub fn len(&self) -> usize {
    self.strings.len()
  }

  /// Checks whether or not the interner is empty.
  pub fn is_empty(&self) -> bool {
    self.strings.is_empty()
  }
}
