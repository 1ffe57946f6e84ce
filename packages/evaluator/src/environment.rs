use crate::value::Value;
use std::collections::HashMap;

/// Lexically scoped variable environment: a stack of scopes searched
/// innermost-first. Assignment updates the nearest scope already holding
/// the variable, otherwise defines it in the current scope.
#[derive(Debug, Default)]
pub struct Environment {
    scopes: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "global scope must stay");
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.scopes
            .first()
            .map_or(false, |scope| scope.contains_key(name))
    }

    /// `$name: value` updates the closest scope defining `name`, else
    /// defines locally. `!global` forces the root scope; `!default` only
    /// assigns when the variable is unset or null.
    pub fn set(&mut self, name: &str, value: Value, global: bool, default: bool) {
        if default {
            let current = self.get(name);
            if current.map_or(false, |existing| !existing.is_null()) {
                return;
            }
        }
        if global {
            self.scopes
                .first_mut()
                .expect("global scope must stay")
                .insert(name.to_string(), value);
            return;
        }
        for scope in self.scopes.iter_mut().rev() {
            if scope.contains_key(name) {
                scope.insert(name.to_string(), value);
                return;
            }
        }
        self.scopes
            .last_mut()
            .expect("at least one scope")
            .insert(name.to_string(), value);
    }

    /// Defines in the current scope unconditionally (parameter binding).
    pub fn define_local(&mut self, name: &str, value: Value) {
        self.scopes
            .last_mut()
            .expect("at least one scope")
            .insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_shadow_and_update() {
        let mut env = Environment::new();
        env.set("x", Value::Bool(true), false, false);
        env.push_scope();
        assert!(env.has("x"));
        // Assigning an outer variable from an inner scope updates it.
        env.set("x", Value::Bool(false), false, false);
        env.pop_scope();
        assert_eq!(env.get("x"), Some(&Value::Bool(false)));
    }

    #[test]
    fn default_only_fills_gaps() {
        let mut env = Environment::new();
        env.set("x", Value::Bool(true), false, true);
        assert_eq!(env.get("x"), Some(&Value::Bool(true)));
        env.set("x", Value::Bool(false), false, true);
        assert_eq!(env.get("x"), Some(&Value::Bool(true)));
        env.set("y", Value::Null, false, false);
        env.set("y", Value::Bool(true), false, true);
        assert_eq!(env.get("y"), Some(&Value::Bool(true)));
    }

    #[test]
    fn global_flag_reaches_root() {
        let mut env = Environment::new();
        env.push_scope();
        env.set("x", Value::Bool(true), true, false);
        env.pop_scope();
        assert!(env.has_global("x"));
    }
}
