/*!
 * Address Space
 * A process's private variables, deep-copied across spawn
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named variables standing in for a process's private memory.
///
/// `Clone` is the duplication semantics: values are owned, so a clone is a
/// deep copy and mutation on one side is invisible to the other. This is
/// the deliberate opposite of the descriptor table, which shares its
/// underlying objects across duplication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSpace {
    vars: HashMap<String, i64>,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: i64) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.vars.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_a_deep_copy() {
        let mut parent = AddressSpace::new();
        parent.set("x", 100);

        let mut child = parent.clone();
        child.set("x", 200);
        parent.set("x", 300);

        assert_eq!(child.get("x"), Some(200));
        assert_eq!(parent.get("x"), Some(300));
    }

    #[test]
    fn test_missing_variable() {
        let space = AddressSpace::new();
        assert_eq!(space.get("nope"), None);
    }
}
