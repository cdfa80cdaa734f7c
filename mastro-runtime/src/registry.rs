use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::component::Definition;
use crate::error::RuntimeError;

/// Custom element definitions by tag name.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    definitions: HashMap<String, Rc<Definition>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, tag: &str, definition: Definition) -> Result<(), RuntimeError> {
        let tag = tag.to_ascii_lowercase();
        if !is_custom_element_name(&tag) {
            return Err(RuntimeError::InvalidTagName(tag));
        }
        if self.definitions.contains_key(&tag) {
            return Err(RuntimeError::AlreadyDefined(tag));
        }
        debug!(%tag, "custom element defined");
        self.definitions.insert(tag, Rc::new(definition));
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> Option<Rc<Definition>> {
        self.definitions.get(&tag.to_ascii_lowercase()).cloned()
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.lookup(tag).is_some()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// `x-counter` yes; `counter`, `-x` and `1-x` no.
pub fn is_custom_element_name(tag: &str) -> bool {
    tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag.contains('-')
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Members;

    #[test]
    fn names() {
        assert!(is_custom_element_name("x-counter"));
        assert!(is_custom_element_name("my-app-2"));
        assert!(!is_custom_element_name("counter"));
        assert!(!is_custom_element_name("-x"));
        assert!(!is_custom_element_name("1-x"));
    }

    #[test]
    fn define_once() {
        let mut registry = Registry::new();
        registry
            .define("X-Counter", Definition::new(|_| Members::new()))
            .unwrap();
        assert!(registry.is_defined("x-counter"));
        assert!(matches!(
            registry.define("x-counter", Definition::new(|_| Members::new())),
            Err(RuntimeError::AlreadyDefined(tag)) if tag == "x-counter"
        ));
        assert!(matches!(
            registry.define("counter", Definition::new(|_| Members::new())),
            Err(RuntimeError::InvalidTagName(_))
        ));
        assert_eq!(registry.len(), 1);
    }
}
