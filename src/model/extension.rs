//! Opaque extension documents attached by external tooling.
//!
//! The engine stores these and hands them back unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in an extension document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionNode {
    pub name: String,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    #[serde(default)]
    pub children: Vec<ExtensionNode>,

    #[serde(default)]
    pub text: Option<String>,
}

impl ExtensionNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ExtensionNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&ExtensionNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Named extension documents.
pub type Extensions = BTreeMap<String, ExtensionNode>;
