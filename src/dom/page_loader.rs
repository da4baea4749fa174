use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::dom_model::{Dom, NodeId};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to read page file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse page JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse page YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A captured page: URL, title and element trees for head and body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub url: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub head: Vec<NodeSpec>,

    #[serde(default)]
    pub body: Vec<NodeSpec>,
}

/// A bare string is a text node; anything else is an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text(String),
    Element(ElementSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,

    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    #[serde(default)]
    pub children: Vec<NodeSpec>,

    /// File names already attached to a file input.
    #[serde(default)]
    pub files: Vec<String>,
}

impl PageSpec {
    pub fn from_json(json: &str) -> Result<Self, PageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PageError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a page from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, PageError> {
        let content = std::fs::read_to_string(path).map_err(|source| PageError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml");
        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Build a fresh page. The mutation log starts empty.
    pub fn build(&self) -> Dom {
        let mut dom = Dom::new(&self.url, &self.title);
        let head = dom.head();
        let body = dom.body();
        for node in &self.head {
            build_node(&mut dom, head, node);
        }
        for node in &self.body {
            build_node(&mut dom, body, node);
        }
        dom.take_added();
        dom
    }
}

/// Append `spec` under `parent`. Nodes created here land in the
/// mutation log, so inserting into a live page is visible to a rescan.
pub fn build_node(dom: &mut Dom, parent: NodeId, spec: &NodeSpec) -> NodeId {
    match spec {
        NodeSpec::Text(text) => dom.create_text(parent, text),
        NodeSpec::Element(el) => {
            let id = dom.create_element_with(parent, &el.tag, el.attrs.clone());
            for file in &el.files {
                dom.attach_file(id, file);
            }
            for child in &el.children {
                build_node(dom, id, child);
            }
            id
        }
    }
}
