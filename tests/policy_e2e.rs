use std::path::Path;

use clarify::policy::{parse_alpha_vectors, parse_policy_graph};
use clarify::{
    build_model, select_start_node, ClarifyError, MalformedArtifactError, NavigationError, Policy,
    PolicyShape, RewardParams, Successor, VariableDomain, World,
};

// Solver output for the cup/book model: ask is_item_cup first, deliver on
// the answer. Node 3 is an unreachable alternative start.
const GRAPH: &str = "\
0 3  - 1 2 - - - -
1 6  - - - - - - -
2 7  - - - - - - -
3 0  - - - 2 1 - -
";

const ALPHA: &str = "\
3
-10 40.5 -12

6
-100 50 -100

7
-100 -100 50

0
-10 38 -15
";

fn model() -> clarify::ModelSpec {
    let domain = VariableDomain::parse("item:book,cup\nroom:kitchen,office\n").unwrap();
    let worlds = vec![
        World::new(["cup", "office"], 3.0),
        World::new(["book", "kitchen"], 1.0),
    ];
    build_model(
        &domain,
        &["item".to_string(), "room".to_string()],
        &worlds,
        &RewardParams::default(),
    )
    .unwrap()
}

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn loads_solver_artifacts_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write(dir.path(), "m.pg", GRAPH);
    let alpha = write(dir.path(), "m.alpha", ALPHA);
    let model = model();

    let policy = Policy::load(&graph, &alpha, &model.belief(), PolicyShape::from(&model)).unwrap();
    assert_eq!(policy.nodes().len(), 4);
    // 0.75 * 40.5 - 0.25 * 12 = 27.375 beats node 3's 0.75 * 38 - 0.25 * 15 = 24.75
    assert_eq!(policy.start(), 0);
    assert_eq!(policy.action_at(policy.start()), Some(3));
    assert_eq!(policy.step(0, 1).unwrap(), 1);
    assert!(policy.is_terminal(1));
    assert!(policy.is_terminal(2));
    assert!(!policy.is_terminal(3));
}

#[test]
fn empty_graph_file_is_unusable_input() {
    let dir = tempfile::tempdir().unwrap();
    let graph = write(dir.path(), "m.pg", "");
    let alpha = write(dir.path(), "m.alpha", ALPHA);
    let model = model();

    let err = Policy::load(&graph, &alpha, &model.belief(), PolicyShape::from(&model)).unwrap_err();
    assert!(matches!(
        err,
        ClarifyError::MalformedArtifact(MalformedArtifactError::Empty { .. })
    ));
    assert!(err.is_unusable_input());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let model = model();
    let err = Policy::load(
        &dir.path().join("absent.pg"),
        &dir.path().join("absent.alpha"),
        &model.belief(),
        PolicyShape::from(&model),
    )
    .unwrap_err();
    assert!(matches!(err, ClarifyError::Io { .. }));
    assert!(err.to_string().contains("absent.pg"));
}

#[test]
fn start_selection_is_deterministic_on_ties() {
    let alphas = parse_alpha_vectors("0\n0 2 2\n1\n0 2 2\n2\n0 1 3\n").unwrap();
    let belief = [0.0, 0.5, 0.5];
    let first = select_start_node(&alphas, &belief).unwrap();
    for _ in 0..10 {
        assert_eq!(select_start_node(&alphas, &belief).unwrap(), first);
    }
    assert_eq!(first, 0);
}

#[test]
fn dash_successors_become_missing_edges() {
    let nodes = parse_policy_graph(GRAPH).unwrap();
    assert_eq!(nodes[0].successor(0), Some(Successor::NoTransition));
    assert_eq!(nodes[3].successor(3), Some(Successor::Node(2)));

    let model = model();
    let policy = Policy::from_artifacts(GRAPH, ALPHA, &model.belief(), PolicyShape::from(&model))
        .unwrap();
    assert_eq!(
        policy.step(0, 0).unwrap_err(),
        NavigationError::MissingEdge {
            node: 0,
            observation: 0
        }
    );
}

#[test]
fn graph_built_for_another_model_is_rejected() {
    let model = model();
    // Only five successors per node, but the model has seven observations.
    let graph = "0 3 - 1 2 - -\n1 6 - - - - -\n2 7 - - - - -\n";
    let alpha = "3\n0 1 0\n6\n0 0 0\n7\n0 0 0\n";
    assert!(matches!(
        Policy::from_artifacts(graph, alpha, &model.belief(), PolicyShape::from(&model))
            .unwrap_err(),
        MalformedArtifactError::SuccessorCountMismatch { expected: 7, .. }
    ));
}
