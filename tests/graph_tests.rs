mod common;

use common::{add, catalog, chain_catalog, step};
use modgraph::{build_graph, ApplicationError, ExecutionPlan};

#[test]
fn test_chain_plan_order() {
    let catalog = chain_catalog();
    let graph = build_graph(&catalog).unwrap();
    let plan = ExecutionPlan::compute(&graph).unwrap();
    assert_eq!(
        plan.order(),
        &["loadGauge", "transform", "source", "solve", "correlate"]
    );
}

#[test]
fn test_independent_modules_keep_registration_order() {
    let mut catalog = catalog();
    add(&mut catalog, "z", step(&[]));
    add(&mut catalog, "a", step(&[]));
    add(&mut catalog, "m", step(&["a"]));
    add(&mut catalog, "b", step(&[]));

    let graph = build_graph(&catalog).unwrap();
    let plan = ExecutionPlan::compute(&graph).unwrap();
    assert_eq!(plan.order(), &["z", "a", "m", "b"]);
}

#[test]
fn test_plan_is_deterministic() {
    let first = ExecutionPlan::compute(&build_graph(&chain_catalog()).unwrap()).unwrap();
    let second = ExecutionPlan::compute(&build_graph(&chain_catalog()).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_consumer_counts_are_distinct_consumers() {
    let graph = build_graph(&chain_catalog()).unwrap();
    let counts = graph.consumer_counts();
    let count = |name: &str| counts[&modgraph::ProductKey::new(name, name)];

    assert_eq!(count("loadGauge"), 1);
    assert_eq!(count("transform"), 3);
    assert_eq!(count("source"), 1);
    assert_eq!(count("solve"), 1);
    assert_eq!(count("correlate"), 0);
}

#[test]
fn test_duplicate_name_rejected() {
    let mut catalog = catalog();
    add(&mut catalog, "gauge", step(&[]));
    let err = catalog
        .add_module("gauge", "Test::Step", step(&[]), Vec::new())
        .unwrap_err();
    assert!(matches!(err, ApplicationError::DuplicateName(name) if name == "gauge"));
    assert_eq!(catalog.len(), 1);
}

#[test]
fn test_unresolved_dependency() {
    let mut catalog = catalog();
    add(&mut catalog, "a", step(&[]));
    add(&mut catalog, "b", step(&["a", "missing"]));

    let err = build_graph(&catalog).unwrap_err();
    match err {
        ApplicationError::UnresolvedDependency { consumer, missing } => {
            assert_eq!(consumer, "b");
            assert_eq!(missing, "missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_output_rejected() {
    let mut catalog = catalog();
    add(&mut catalog, "prop", serde_json::json!({"extra_outputs": ["prop_5d"]}));
    add(&mut catalog, "other", serde_json::json!({"extra_outputs": ["prop_5d"]}));

    let err = build_graph(&catalog).unwrap_err();
    match err {
        ApplicationError::DuplicateOutput {
            product,
            first,
            second,
        } => {
            assert_eq!(product, "prop_5d");
            assert_eq!(first, "prop");
            assert_eq!(second, "other");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_secondary_output_resolves_to_its_producer() {
    let mut catalog = catalog();
    add(&mut catalog, "prop", serde_json::json!({"extra_outputs": ["prop_5d"]}));
    add(&mut catalog, "reader", step(&["prop_5d"]));

    let graph = build_graph(&catalog).unwrap();
    assert_eq!(graph.producers_of("reader").unwrap(), vec!["prop"]);
    let counts = graph.consumer_counts();
    assert_eq!(counts[&modgraph::ProductKey::new("prop", "prop_5d")], 1);
    assert_eq!(counts[&modgraph::ProductKey::new("prop", "prop")], 0);
}

#[test]
fn test_cycle_names_participants() {
    let mut catalog = catalog();
    add(&mut catalog, "root", step(&[]));
    add(&mut catalog, "p", step(&["root", "r"]));
    add(&mut catalog, "q", step(&["p"]));
    add(&mut catalog, "r", step(&["q"]));

    let err = build_graph(&catalog).unwrap_err();
    match err {
        ApplicationError::CyclicDependency { cycle } => {
            assert_eq!(cycle.first(), cycle.last());
            for name in ["p", "q", "r"] {
                assert!(cycle.iter().any(|c| c == name), "{name} missing from {cycle:?}");
            }
            assert!(!cycle.iter().any(|c| c == "root"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_extra_inputs_become_edges() {
    let mut catalog = catalog();
    add(&mut catalog, "a", step(&[]));
    catalog
        .add_module("b", "Test::Step", step(&[]), vec!["a".to_string()])
        .unwrap();

    let graph = build_graph(&catalog).unwrap();
    assert_eq!(graph.producers_of("b").unwrap(), vec!["a"]);
    assert_eq!(graph.consumers_of("a").unwrap(), vec!["b"]);
}

#[test]
fn test_schedule_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sched/plan.sched");
    let graph = build_graph(&chain_catalog()).unwrap();

    let plan = ExecutionPlan::compute(&graph).unwrap();
    plan.save(&path).unwrap();
    let loaded = ExecutionPlan::load(&graph, &path).unwrap();
    assert_eq!(loaded.order(), plan.order());
}

#[test]
fn test_schedule_violating_dependencies_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.sched");
    std::fs::write(&path, "transform\nloadGauge\nsource\nsolve\ncorrelate\n").unwrap();

    let graph = build_graph(&chain_catalog()).unwrap();
    let err = ExecutionPlan::load(&graph, &path).unwrap_err();
    assert!(matches!(err, ApplicationError::InvalidSchedule(_)));
}

#[test]
fn test_dot_lists_every_module() {
    let graph = build_graph(&chain_catalog()).unwrap();
    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph"));
    for name in graph.module_names() {
        assert!(dot.contains(&name), "{name} missing from graph");
    }
}
