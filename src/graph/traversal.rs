use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::path::Path;

use petgraph::stable_graph::NodeIndex;

use super::types::DependencyGraph;
use crate::error::{ApplicationError, ApplicationResult};

/// Ready set for a stable topological walk.
///
/// Ready modules are handed out lowest registration position first, so the
/// same catalog always yields the same order.
pub struct ReadyQueue<'g> {
    graph: &'g DependencyGraph,
    /// Unfinished producers per registration position.
    in_degree: Vec<usize>,
    /// Registration position of each node index.
    position: HashMap<NodeIndex, usize>,
    ready: BinaryHeap<Reverse<usize>>,
    remaining: usize,
}

impl<'g> ReadyQueue<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        let position: HashMap<NodeIndex, usize> = graph
            .order
            .iter()
            .enumerate()
            .map(|(pos, idx)| (*idx, pos))
            .collect();

        let in_degree: Vec<usize> = graph
            .order
            .iter()
            .map(|idx| {
                graph
                    .graph
                    .neighbors_directed(*idx, petgraph::Direction::Incoming)
                    .collect::<HashSet<_>>()
                    .len()
            })
            .collect();

        let ready = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(pos, _)| Reverse(pos))
            .collect();

        Self {
            graph,
            in_degree,
            position,
            ready,
            remaining: graph.order.len(),
        }
    }

    /// Take the earliest-registered ready module.
    pub fn pop(&mut self) -> Option<NodeIndex> {
        self.ready
            .pop()
            .map(|Reverse(pos)| self.graph.order[pos])
    }

    /// Take up to `max` ready modules, earliest-registered first.
    pub fn pop_batch(&mut self, max: usize) -> Vec<NodeIndex> {
        let mut batch = Vec::new();
        while batch.len() < max.max(1) {
            match self.pop() {
                Some(idx) => batch.push(idx),
                None => break,
            }
        }
        batch
    }

    /// Mark `idx` finished and release the dependents it was blocking.
    pub fn complete(&mut self, idx: NodeIndex) {
        self.remaining = self.remaining.saturating_sub(1);
        let successors: HashSet<NodeIndex> = self
            .graph
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        for succ in successors {
            if let Some(&pos) = self.position.get(&succ) {
                self.in_degree[pos] = self.in_degree[pos].saturating_sub(1);
                if self.in_degree[pos] == 0 {
                    self.ready.push(Reverse(pos));
                }
            }
        }
    }

    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Modules not yet completed.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

/// Deterministic topological execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    order: Vec<String>,
    indices: Vec<NodeIndex>,
}

impl ExecutionPlan {
    /// Stable topological sort of `graph`.
    pub fn compute(graph: &DependencyGraph) -> ApplicationResult<Self> {
        let mut queue = ReadyQueue::new(graph);
        let mut indices = Vec::with_capacity(graph.len());
        while let Some(idx) = queue.pop() {
            indices.push(idx);
            queue.complete(idx);
        }

        if indices.len() != graph.len() {
            return Err(ApplicationError::Internal(format!(
                "topological sort visited {} of {} modules",
                indices.len(),
                graph.len()
            )));
        }

        let order = indices
            .iter()
            .map(|idx| graph.node(*idx).map(|n| n.name.clone()))
            .collect::<ApplicationResult<Vec<_>>>()?;
        Ok(Self { order, indices })
    }

    /// Validate an externally supplied order against `graph`.
    ///
    /// Every module must appear exactly once and after all of its producers.
    pub fn from_names(graph: &DependencyGraph, names: Vec<String>) -> ApplicationResult<Self> {
        let mut indices = Vec::with_capacity(names.len());
        let mut seen: HashSet<NodeIndex> = HashSet::new();

        for name in &names {
            let idx = graph.node_index_map.get(name).copied().ok_or_else(|| {
                ApplicationError::InvalidSchedule(format!("unknown module '{}'", name))
            })?;
            if !seen.insert(idx) {
                return Err(ApplicationError::InvalidSchedule(format!(
                    "module '{}' scheduled twice",
                    name
                )));
            }
            for producer in graph
                .graph
                .neighbors_directed(idx, petgraph::Direction::Incoming)
            {
                if !seen.contains(&producer) {
                    let producer_name = graph.node(producer)?.name.clone();
                    return Err(ApplicationError::InvalidSchedule(format!(
                        "module '{}' scheduled before its dependency '{}'",
                        name, producer_name
                    )));
                }
            }
            indices.push(idx);
        }

        if indices.len() != graph.len() {
            let missing: Vec<String> = graph
                .module_names()
                .into_iter()
                .filter(|n| !names.contains(n))
                .collect();
            return Err(ApplicationError::InvalidSchedule(format!(
                "modules missing from schedule: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            order: names,
            indices,
        })
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn indices(&self) -> &[NodeIndex] {
        &self.indices
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Write the plan, one module name per line.
    pub fn save(&self, path: &Path) -> ApplicationResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = self.order.join("\n");
        text.push('\n');
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Read a schedule file and validate it against `graph`.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn load(graph: &DependencyGraph, path: &Path) -> ApplicationResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self::from_names(graph, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleCatalog;
    use crate::graph::build_graph;
    use crate::modules::create_default_registry;
    use serde_json::json;
    use std::sync::Arc;

    /// loadGauge, transform, source, solve, correlate
    fn chain_graph() -> DependencyGraph {
        let mut catalog = ModuleCatalog::new(Arc::new(create_default_registry()));
        catalog
            .add_module("loadGauge", "MIO::LoadNersc", json!({"file": "cfg"}), vec![])
            .unwrap();
        catalog
            .add_module(
                "transform",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "loadGauge"}),
                vec![],
            )
            .unwrap();
        catalog
            .add_module("source", "MSource::Z2Adj", json!({"tA": 0, "tB": 0}), vec![])
            .unwrap();
        catalog
            .add_module(
                "solve",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "transform"}),
                vec![],
            )
            .unwrap();
        catalog
            .add_module(
                "correlate",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "solve"}),
                vec!["source".to_string()],
            )
            .unwrap();
        build_graph(&catalog).unwrap()
    }

    #[test]
    fn test_stable_order() {
        let graph = chain_graph();
        let plan = ExecutionPlan::compute(&graph).unwrap();
        assert_eq!(
            plan.order(),
            ["loadGauge", "transform", "source", "solve", "correlate"]
        );
        assert_eq!(plan.position("solve"), Some(3));
    }

    #[test]
    fn test_ready_queue_batches() {
        let graph = chain_graph();
        let mut queue = ReadyQueue::new(&graph);

        let first = queue.pop_batch(4);
        let names: Vec<&str> = first
            .iter()
            .map(|i| graph.node(*i).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["loadGauge", "source"]);

        for idx in first {
            queue.complete(idx);
        }
        let second = queue.pop_batch(4);
        assert_eq!(second.len(), 1);
        assert_eq!(graph.node(second[0]).unwrap().name, "transform");
        assert_eq!(queue.remaining(), 3);
    }

    #[test]
    fn test_from_names_validates() {
        let graph = chain_graph();
        let ok = ExecutionPlan::from_names(
            &graph,
            ["source", "loadGauge", "transform", "solve", "correlate"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        assert!(ok.is_ok());

        let bad_order = ExecutionPlan::from_names(
            &graph,
            ["transform", "loadGauge", "source", "solve", "correlate"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        assert!(matches!(bad_order, Err(ApplicationError::InvalidSchedule(_))));

        let missing = ExecutionPlan::from_names(
            &graph,
            ["loadGauge", "transform"].iter().map(|s| s.to_string()).collect(),
        );
        assert!(matches!(missing, Err(ApplicationError::InvalidSchedule(_))));

        let duplicate = ExecutionPlan::from_names(
            &graph,
            ["loadGauge", "loadGauge"].iter().map(|s| s.to_string()).collect(),
        );
        assert!(matches!(duplicate, Err(ApplicationError::InvalidSchedule(_))));
    }

    #[test]
    fn test_save_and_load() {
        let graph = chain_graph();
        let plan = ExecutionPlan::compute(&graph).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sched/run.sched");

        plan.save(&path).unwrap();
        let loaded = ExecutionPlan::load(&graph, &path).unwrap();
        assert_eq!(loaded, plan);
    }
}
