use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::catalog::ModuleCatalog;
use crate::error::{ApplicationError, ApplicationResult};

use super::types::*;
use super::validator::find_cycle;

/// Resolve every declared input against the catalog's products and build the
/// dependency graph.
///
/// Fails with `DuplicateOutput` when two modules publish the same product,
/// `UnresolvedDependency` for the first input (in registration order) naming
/// no product, and `CyclicDependency` with the full cycle path. The catalog is
/// only read, so repeated builds of an unchanged catalog yield the same graph.
pub fn build_graph(catalog: &ModuleCatalog) -> ApplicationResult<DependencyGraph> {
    let mut graph = StableDiGraph::<ModuleNode, ProductEdge>::new();
    let mut order: Vec<NodeIndex> = Vec::with_capacity(catalog.len());
    let mut node_index_map: HashMap<String, NodeIndex> = HashMap::new();
    let mut product_index: HashMap<String, ProductKey> = HashMap::new();

    // 1. Nodes and the products they publish
    for decl in catalog.iter() {
        for output in decl.outputs() {
            if let Some(existing) = product_index.get(&output.name) {
                return Err(ApplicationError::DuplicateOutput {
                    product: output.name.clone(),
                    first: existing.module.clone(),
                    second: decl.name().to_string(),
                });
            }
            product_index.insert(
                output.name.clone(),
                ProductKey::new(decl.name(), &output.name),
            );
        }

        let idx = graph.add_node(ModuleNode {
            name: decl.name().to_string(),
            module_type: decl.module_type().to_string(),
            inputs: Vec::new(),
            outputs: decl.outputs().to_vec(),
        });
        order.push(idx);
        node_index_map.insert(decl.name().to_string(), idx);
    }

    // 2. Producer -> consumer edges
    for (position, decl) in catalog.iter().enumerate() {
        let consumer = order[position];
        let mut resolved = Vec::with_capacity(decl.inputs().len());

        for input in decl.inputs() {
            let key = product_index
                .get(input)
                .cloned()
                .ok_or_else(|| ApplicationError::UnresolvedDependency {
                    consumer: decl.name().to_string(),
                    missing: input.clone(),
                })?;
            let producer = node_index_map[&key.module];

            match graph.find_edge(producer, consumer) {
                Some(edge) => graph[edge].products.push(input.clone()),
                None => {
                    graph.add_edge(
                        producer,
                        consumer,
                        ProductEdge {
                            products: vec![input.clone()],
                        },
                    );
                }
            }
            resolved.push(key);
        }

        graph[consumer].inputs = resolved;
    }

    // 3. DAG check
    if let Some(cycle) = find_cycle(&graph, &order) {
        return Err(ApplicationError::CyclicDependency { cycle });
    }

    tracing::info!(
        modules = graph.node_count(),
        edges = graph.edge_count(),
        products = product_index.len(),
        "dependency graph built"
    );

    Ok(DependencyGraph {
        graph,
        order,
        node_index_map,
        product_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::create_default_registry;
    use serde_json::json;
    use std::sync::Arc;

    fn driver_catalog() -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new(Arc::new(create_default_registry()));
        catalog
            .add_module("gauge", "MIO::LoadNersc", json!({"file": "cfg"}), vec![])
            .unwrap();
        catalog
            .add_module(
                "adjgauge",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "gauge"}),
                vec![],
            )
            .unwrap();
        catalog
            .add_module("z2wall", "MSource::Z2Adj", json!({"tA": 0, "tB": 0}), vec![])
            .unwrap();
        catalog
            .add_module("sink", "MSink::ScalarPoint", json!({"mom": "0 0 0"}), vec![])
            .unwrap();
        catalog
            .add_module(
                "mobiusadj",
                "MAction::MobiusDWFAdj",
                json!({
                    "gauge": "adjgauge", "Ls": 8, "mass": 0.05, "M5": 1.8,
                    "b": 1.0, "c": 0.0, "boundary": "1 1 1 -1", "twist": "0. 0. 0. 0."
                }),
                vec![],
            )
            .unwrap();
        catalog
            .add_module(
                "cg",
                "MSolver::RBPrecCGAdj",
                json!({"action": "mobiusadj", "residual": 1e-8, "maxIteration": 10000}),
                vec![],
            )
            .unwrap();
        catalog
            .add_module(
                "prop",
                "MFermion::GaugePropAdj",
                json!({"solver": "cg", "source": "z2wall"}),
                vec![],
            )
            .unwrap();
        catalog
            .add_module(
                "meson_pt_ll",
                "MContraction::MesonAdj",
                json!({
                    "output": "mesons/pt_ll", "q1": "prop", "q2": "prop",
                    "gammas": "all", "sink": "sink"
                }),
                vec![],
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_build_driver_graph() {
        let graph = build_graph(&driver_catalog()).unwrap();

        assert_eq!(graph.len(), 8);
        assert_eq!(graph.producers_of("prop").unwrap(), vec!["z2wall", "cg"]);
        assert_eq!(graph.consumers_of("prop").unwrap(), vec!["meson_pt_ll"]);
        assert_eq!(
            graph.producers_of("meson_pt_ll").unwrap(),
            vec!["sink", "prop"]
        );
        assert_eq!(
            graph.product_index["prop_5d"],
            ProductKey::new("prop", "prop_5d")
        );
    }

    #[test]
    fn test_consumer_counts() {
        let graph = build_graph(&driver_catalog()).unwrap();
        let counts = graph.consumer_counts();

        assert_eq!(counts[&ProductKey::new("gauge", "gauge")], 1);
        // q1 and q2 both name prop; one consumer
        assert_eq!(counts[&ProductKey::new("prop", "prop")], 1);
        assert_eq!(counts[&ProductKey::new("prop", "prop_5d")], 0);
        assert_eq!(counts[&ProductKey::new("meson_pt_ll", "meson_pt_ll")], 0);
    }

    #[test]
    fn test_unresolved_dependency() {
        let mut catalog = ModuleCatalog::new(Arc::new(create_default_registry()));
        catalog
            .add_module(
                "adjgauge",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "X"}),
                vec![],
            )
            .unwrap();

        match build_graph(&catalog) {
            Err(ApplicationError::UnresolvedDependency { consumer, missing }) => {
                assert_eq!(consumer, "adjgauge");
                assert_eq!(missing, "X");
            }
            other => panic!("unexpected: {:?}", other.map(|g| g.module_names())),
        }
    }

    #[test]
    fn test_undeclared_5d_reference_is_unresolved() {
        let mut catalog = ModuleCatalog::new(Arc::new(create_default_registry()));
        catalog
            .add_module("gauge", "MIO::LoadNersc", json!({"file": "cfg"}), vec![])
            .unwrap();
        catalog
            .add_module(
                "adjgauge",
                "MGauge::FundtoAdjoint",
                json!({"gaugeconf": "gauge"}),
                vec!["gauge_5d".to_string()],
            )
            .unwrap();

        assert!(matches!(
            build_graph(&catalog),
            Err(ApplicationError::UnresolvedDependency { missing, .. }) if missing == "gauge_5d"
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let mut catalog = ModuleCatalog::new(Arc::new(create_default_registry()));
        catalog
            .add_module("a", "MGauge::FundtoAdjoint", json!({"gaugeconf": "b"}), vec![])
            .unwrap();
        catalog
            .add_module("b", "MGauge::FundtoAdjoint", json!({"gaugeconf": "a"}), vec![])
            .unwrap();

        match build_graph(&catalog) {
            Err(ApplicationError::CyclicDependency { cycle }) => {
                assert!(cycle.contains(&"a".to_string()));
                assert!(cycle.contains(&"b".to_string()));
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("unexpected: {:?}", other.map(|g| g.module_names())),
        }
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let mut catalog = ModuleCatalog::new(Arc::new(create_default_registry()));
        catalog
            .add_module("a", "MGauge::FundtoAdjoint", json!({"gaugeconf": "a"}), vec![])
            .unwrap();
        assert!(matches!(
            build_graph(&catalog),
            Err(ApplicationError::CyclicDependency { cycle }) if cycle == vec!["a", "a"]
        ));
    }

    #[test]
    fn test_build_is_deterministic() {
        let catalog = driver_catalog();
        let first = build_graph(&catalog).unwrap();
        let second = build_graph(&catalog).unwrap();
        assert_eq!(first.module_names(), second.module_names());
        assert_eq!(first.to_dot(), second.to_dot());
    }
}
