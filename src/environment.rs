use std::collections::HashMap;

/// The interpreter's variable table, seeded from the process environment at
/// startup. Writes are mirrored into the process environment so that forked
/// children inherit them; children see a snapshot taken at fork time, never
/// a live reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            vars: std::env::vars().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
        // The interpreter is single-threaded, which is what makes mutating
        // the process environment sound here.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(key);
        unsafe {
            std::env::remove_var(key);
        }
    }

    pub fn home(&self) -> Option<&str> {
        self.get("HOME")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
