//! Static classification hierarchy.
//!
//! Nodes live in an arena keyed by code; child codes are textual extensions
//! of their parent code, so the tree is acyclic by construction and parent
//! resolution is a longest-proper-prefix lookup. The main classes are
//! registered statically; everything below them comes from the codes
//! actually observed in the catalog.

use crate::model::types::MAIN_CLASSES;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ClassificationNode {
    pub code: String,
    pub label: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

impl ClassificationNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ClassificationTree {
    nodes: HashMap<String, ClassificationNode>,
    roots: Vec<String>,
}

impl ClassificationTree {
    /// Build the arena from the registered main classes plus every
    /// classification code observed in the catalog.
    pub fn build(observed: impl IntoIterator<Item = String>) -> Self {
        let mut nodes: HashMap<String, ClassificationNode> = HashMap::new();
        let mut roots: Vec<String> = Vec::new();

        for (code, label) in MAIN_CLASSES {
            nodes.insert(
                (*code).to_string(),
                ClassificationNode {
                    code: (*code).to_string(),
                    label: (*label).to_string(),
                    parent: None,
                    children: Vec::new(),
                },
            );
            roots.push((*code).to_string());
        }

        for raw in observed {
            let code = raw.trim().to_ascii_uppercase();
            if code.is_empty() || nodes.contains_key(&code) {
                continue;
            }
            nodes.insert(
                code.clone(),
                ClassificationNode {
                    label: code.clone(),
                    code,
                    parent: None,
                    children: Vec::new(),
                },
            );
        }

        // Parent = longest proper prefix present in the arena.
        let codes: Vec<String> = nodes.keys().cloned().collect();
        for code in &codes {
            if nodes[code].parent.is_some() || roots.contains(code) {
                continue;
            }
            let parent = (1..code.len())
                .rev()
                .map(|n| &code[..n])
                .find(|prefix| nodes.contains_key(*prefix))
                .map(str::to_string);
            if let Some(parent_code) = parent {
                nodes.get_mut(code).unwrap().parent = Some(parent_code.clone());
                nodes.get_mut(&parent_code).unwrap().children.push(code.clone());
            }
        }

        for node in nodes.values_mut() {
            node.children.sort_by(|a, b| (a.len(), a.as_str()).cmp(&(b.len(), b.as_str())));
        }
        roots.sort();

        ClassificationTree { nodes, roots }
    }

    pub fn get(&self, code: &str) -> Option<&ClassificationNode> {
        self.nodes.get(&code.trim().to_ascii_uppercase())
    }

    /// The registered top-level code set, in code order.
    pub fn roots(&self) -> Vec<&ClassificationNode> {
        self.roots.iter().map(|code| &self.nodes[code]).collect()
    }

    /// Children of `code`, or `None` when the code is not registered.
    pub fn children(&self, code: &str) -> Option<Vec<&ClassificationNode>> {
        self.get(code)
            .map(|node| node.children.iter().map(|c| &self.nodes[c]).collect())
    }
}
