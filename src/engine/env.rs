//! Named values a script keeps across reloads.
//!
//! A script is re-run from the top on every reload, so plain locals start
//! over each time. `define` gives a script a slot that is created once and
//! then left alone, `set` overwrites it. Only `reset` empties the store.

use std::any::Any;
use std::collections::HashMap;

use tracing::debug;

use super::Engine;

#[derive(Default)]
pub(crate) struct Env {
    values: HashMap<String, Box<dyn Any>>,
}

impl Env {
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl Engine {
    /// Create `name` with `default` unless it already holds a `T`, and return
    /// its current value.
    ///
    /// A slot holding a different type is replaced, so an edited script that
    /// changes a value's type starts from the new default.
    pub fn define<T: Any + Clone>(&mut self, name: &str, default: T) -> T {
        if let Some(value) = self.get::<T>(name) {
            return value;
        }
        if self.env.values.contains_key(name) {
            debug!(name, "redefined with a new type");
        }
        self.env.values.insert(name.to_string(), Box::new(default.clone()));
        default
    }

    /// Store `value` under `name`, whatever was there before
    pub fn set<T: Any>(&mut self, name: &str, value: T) {
        self.env.values.insert(name.to_string(), Box::new(value));
    }

    /// Current value of `name`, if it holds a `T`
    pub fn get<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.env.values.get(name)?.downcast_ref::<T>().cloned()
    }

    /// Mutable access to `name`, if it holds a `T`
    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.env.values.get_mut(name)?.downcast_mut::<T>()
    }

    /// Number of named values
    pub fn defined(&self) -> usize {
        self.env.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::ManualClock;
    use crate::engine::config::EngineConfig;

    fn engine() -> Engine {
        Engine::with_wall_clock(EngineConfig::default(), ManualClock::new()).unwrap()
    }

    #[test]
    fn test_define_keeps_existing_value() {
        let mut engine = engine();
        assert_eq!(engine.define("root", 60u8), 60);
        engine.set("root", 62u8);
        assert_eq!(engine.define("root", 60u8), 62);
        assert_eq!(engine.defined(), 1);
    }

    #[test]
    fn test_define_replaces_value_of_other_type() {
        let mut engine = engine();
        engine.set("root", "C4".to_string());
        assert_eq!(engine.define("root", 60u8), 60);
        assert_eq!(engine.get::<String>("root"), None);
        assert_eq!(engine.get::<u8>("root"), Some(60));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut engine = engine();
        engine.define("notes", vec![60u8]);
        if let Some(notes) = engine.get_mut::<Vec<u8>>("notes") {
            notes.push(64);
        }
        assert_eq!(engine.get::<Vec<u8>>("notes"), Some(vec![60, 64]));
        assert!(engine.get_mut::<u8>("notes").is_none());
        assert!(engine.get::<u8>("missing").is_none());
    }

    #[test]
    fn test_values_survive_reload_but_not_reset() {
        let mut engine = engine();
        engine.start();

        let script = |e: &mut Engine| {
            let runs = e.define("runs", 0u32);
            e.set("runs", runs + 1);
        };
        engine.run_script(script);
        engine.reload(script);
        engine.reload(script);
        assert_eq!(engine.get::<u32>("runs"), Some(3));

        engine.reset();
        assert_eq!(engine.defined(), 0);
        engine.run_script(script);
        assert_eq!(engine.get::<u32>("runs"), Some(1));
    }
}
