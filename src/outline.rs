//! Host outline data model: string properties on the current entry.

use std::collections::BTreeMap;

pub trait Outline {
    fn get_attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &str, value: &str);
}

/// In-memory outline entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub heading: String,
    properties: BTreeMap<String, String>,
}

impl Entry {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Outline for Entry {
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }
}
