use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{ApplicationError, ApplicationResult};
use crate::modules::OutputDecl;

/// Store key of a product: the producing module and the product name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductKey {
    pub module: String,
    pub output: String,
}

impl ProductKey {
    pub fn new(module: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            output: output.into(),
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.output)
    }
}

/// Graph node
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub name: String,
    pub module_type: String,
    /// Resolved inputs, one per distinct product.
    pub inputs: Vec<ProductKey>,
    pub outputs: Vec<OutputDecl>,
}

/// Graph edge, producer to consumer. Lists every product carried.
#[derive(Debug, Clone, Default)]
pub struct ProductEdge {
    pub products: Vec<String>,
}

impl fmt::Display for ProductEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.products.join(", "))
    }
}

impl fmt::Display for ModuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.module_type)
    }
}

/// Validated, acyclic module dependency graph
#[derive(Debug)]
pub struct DependencyGraph {
    pub graph: StableDiGraph<ModuleNode, ProductEdge>,
    /// Node indices in registration order.
    pub order: Vec<NodeIndex>,
    pub node_index_map: HashMap<String, NodeIndex>,
    /// Product name to its store key.
    pub product_index: HashMap<String, ProductKey>,
}

impl DependencyGraph {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn node(&self, idx: NodeIndex) -> ApplicationResult<&ModuleNode> {
        self.graph
            .node_weight(idx)
            .ok_or_else(|| ApplicationError::Internal(format!("no node at index {}", idx.index())))
    }

    pub fn index_of(&self, name: &str) -> ApplicationResult<NodeIndex> {
        self.node_index_map
            .get(name)
            .copied()
            .ok_or_else(|| ApplicationError::UnknownModule(name.to_string()))
    }

    pub fn get_node(&self, name: &str) -> ApplicationResult<&ModuleNode> {
        self.node(self.index_of(name)?)
    }

    /// Module names in registration order.
    pub fn module_names(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|idx| self.graph.node_weight(*idx).map(|n| n.name.clone()))
            .collect()
    }

    /// Modules this one depends on, in registration order.
    pub fn producers_of(&self, name: &str) -> ApplicationResult<Vec<String>> {
        self.neighbors(name, petgraph::Direction::Incoming)
    }

    /// Modules that depend on this one, in registration order.
    pub fn consumers_of(&self, name: &str) -> ApplicationResult<Vec<String>> {
        self.neighbors(name, petgraph::Direction::Outgoing)
    }

    /// Number of distinct modules consuming each product.
    pub fn consumer_counts(&self) -> HashMap<ProductKey, usize> {
        let mut counts: HashMap<ProductKey, usize> = HashMap::new();
        for node in self.graph.node_weights() {
            for output in &node.outputs {
                counts
                    .entry(ProductKey::new(&node.name, &output.name))
                    .or_insert(0);
            }
        }
        for node in self.graph.node_weights() {
            for key in &node.inputs {
                *counts.entry(key.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Graphviz DOT rendering of the graph.
    pub fn to_dot(&self) -> String {
        format!("{}", petgraph::dot::Dot::new(&self.graph))
    }

    fn neighbors(&self, name: &str, dir: petgraph::Direction) -> ApplicationResult<Vec<String>> {
        let idx = self.index_of(name)?;
        let mut indices: Vec<NodeIndex> = self.graph.neighbors_directed(idx, dir).collect();
        indices.sort();
        Ok(indices
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n).map(|node| node.name.clone()))
            .collect())
    }
}
