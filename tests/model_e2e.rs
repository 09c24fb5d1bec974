use clarify::model::{OBS_NO, OBS_NONE, OBS_YES, TERMINAL_STATE};
use clarify::{
    build_model, normalize_weights, to_solver_format, write_model_file, ActionKind,
    ConfigurationError, ModelBuilder, RewardParams, VariableDomain, World,
};

const DOMAIN: &str = "item:coffee,sandwich\nroom:kitchen,lab,office\nperson:alice,bob\n";

fn domain() -> VariableDomain {
    VariableDomain::parse(DOMAIN).unwrap()
}

fn vars() -> Vec<String> {
    ["item", "room", "person"].map(String::from).to_vec()
}

fn worlds() -> Vec<World> {
    vec![
        World::new(["coffee", "office", "alice"], 0.6),
        World::new(["coffee", "lab", "bob"], 0.3),
        World::new(["sandwich", "kitchen", "alice"], 0.1),
    ]
}

#[test]
fn two_world_scenario_writes_expected_solver_text() {
    let domain = VariableDomain::parse("item:book,cup\nroom:kitchen,office\n").unwrap();
    let worlds = vec![
        World::new(["cup", "office"], 3.0),
        World::new(["book", "kitchen"], 1.0),
    ];
    let model = build_model(
        &domain,
        &["item".to_string(), "room".to_string()],
        &worlds,
        &RewardParams::default(),
    )
    .unwrap();
    let text = to_solver_format(&model);

    assert!(text.starts_with("discount: 0.95\n\nvalues: reward\n\n"));
    assert!(text.contains("states: term cup_office book_kitchen\n\n"));
    assert!(text.contains(
        "actions: which_item which_room is_item_book is_item_cup is_room_kitchen is_room_office deliver_cup_office deliver_book_kitchen\n\n"
    ));
    assert!(text.contains("observations: none yes no book cup kitchen office\n\n"));
    assert!(text.contains("start: 0.0000 0.7500 0.2500\n\n"));
    assert!(text.contains("T: which_item identity\n"));
    assert!(text.contains("T: deliver_cup_office : * : term 1.0\n"));
    assert!(text.contains(
        "O: which_room\n1.0 0.0 0.0 0.0 0.0 0.0 0.0\n0.0 0.0 0.0 0.0 0.0 0.0 1.0\n0.0 0.0 0.0 0.0 0.0 1.0 0.0\n"
    ));
    assert!(text.contains(
        "O: is_item_cup\n1.0 0.0 0.0 0.0 0.0 0.0 0.0\n0.0 1.0 0.0 0.0 0.0 0.0 0.0\n0.0 0.0 1.0 0.0 0.0 0.0 0.0\n"
    ));
    assert!(text.contains("O: deliver_book_kitchen uniform\n"));
    assert!(text.contains("R: which_item : * : * : * -10\n"));
    assert!(text.contains("R: is_room_office : * : * : * -1\n"));
    assert!(text.contains("R: deliver_cup_office : cup_office : term : * 50\n"));
    assert!(text.contains("R: deliver_cup_office : book_kitchen : term : * -100\n"));
}

#[test]
fn start_distribution_always_sums_to_one() {
    let cases: &[&[f64]] = &[
        &[1.0, 1.0, 1.0],
        &[4.0, 1.0, 1.0],
        &[1.0; 7],
        &[0.3333, 0.3333, 0.3334],
        &[1e-6, 1.0, 1.0, 1.0],
        &[5.0],
    ];
    for weights in cases {
        let probs = normalize_weights(weights).unwrap();
        assert_eq!(probs.total_units(), 10_000, "weights {weights:?}");
    }
}

#[test]
fn equal_thirds_put_rounding_shortfall_on_term() {
    let thirds: Vec<World> = (0..3)
        .map(|i| World::new(["coffee", ["kitchen", "lab", "office"][i], "alice"], 1.0))
        .collect();
    let model = build_model(&domain(), &vars(), &thirds, &RewardParams::default()).unwrap();
    let text = to_solver_format(&model);
    assert!(text.contains("start: 0.0001 0.3333 0.3333 0.3333\n"));
    assert_eq!(model.belief_units(), 10_000);
}

#[test]
fn index_layout_is_consistent() {
    let model = build_model(&domain(), &vars(), &worlds(), &RewardParams::default()).unwrap();

    assert_eq!(model.states[0].name, TERMINAL_STATE);
    assert_eq!(model.states.len(), 4);
    assert_eq!(
        model.states.iter().filter(|s| s.is_terminal()).count(),
        1
    );

    // 3 which + 7 polar questions, then one delivery per world
    assert_eq!(model.question_count, 10);
    assert_eq!(model.actions.len(), 13);
    for (index, action) in model.actions.iter().enumerate() {
        assert_eq!(action.index, index);
        assert_eq!(action.kind.is_delivery(), model.delivery_range().contains(&index));
    }
    for action in &model.actions[model.delivery_range()] {
        let ActionKind::Delivery { target, state_index } = &action.kind else {
            panic!("expected delivery");
        };
        assert_eq!(&model.states[*state_index].name, target);
        assert_eq!(action.name, format!("deliver_{target}"));
    }

    assert_eq!(&model.observations[..3], [OBS_NONE, OBS_YES, OBS_NO]);
    assert_eq!(model.observations.len(), 3 + 7);
}

#[test]
fn transition_and_observation_laws() {
    let model = build_model(&domain(), &vars(), &worlds(), &RewardParams::default()).unwrap();
    let n = model.states.len();
    let m = model.observations.len();

    for a in 0..model.actions.len() {
        for s in 0..n {
            let row: f64 = (0..n).map(|e| model.transition_probability(a, s, e)).sum();
            assert!((row - 1.0).abs() < 1e-9, "T row of action {a} state {s}");
            if a < model.question_count {
                assert!((model.transition_probability(a, s, s) - 1.0).abs() < 1e-9);
            } else {
                assert!((model.transition_probability(a, s, 0) - 1.0).abs() < 1e-9);
            }
        }
        for e in 0..n {
            let row: f64 = (0..m).map(|o| model.observation_probability(a, e, o)).sum();
            assert!((row - 1.0).abs() < 1e-9, "O row of action {a} state {e}");
        }
    }

    // Terminal state always observes `none` for questions.
    for a in 0..model.question_count {
        assert!((model.observation_probability(a, 0, 0) - 1.0).abs() < 1e-9);
    }

    // which_person in coffee_lab_bob observes `bob`.
    let which_person = model.actions.iter().position(|a| a.name == "which_person").unwrap();
    let lab = model.state_index("coffee_lab_bob").unwrap();
    let bob = model.observation_index("bob").unwrap();
    assert!((model.observation_probability(which_person, lab, bob) - 1.0).abs() < 1e-9);
}

#[test]
fn builder_defaults_to_all_domain_variables() {
    let model = ModelBuilder::new(domain())
        .worlds(worlds())
        .rewards(RewardParams::new(-3.0, -0.5, 10.0, -20.0))
        .build()
        .unwrap();
    assert_eq!(model.question_count, 10);
    let text = to_solver_format(&model);
    assert!(text.contains("R: is_item_coffee : * : * : * -0.5\n"));
    assert!(text.contains("R: deliver_coffee_lab_bob : coffee_office_alice : term : * -20\n"));
}

#[test]
fn bad_worlds_never_produce_a_model() {
    let d = domain();
    let v = vars();
    let r = RewardParams::default();

    assert_eq!(
        build_model(&d, &v, &[], &r).unwrap_err(),
        ConfigurationError::NoWorlds
    );
    assert!(matches!(
        build_model(&d, &v, &[World::new(["coffee", "lab"], 1.0)], &r).unwrap_err(),
        ConfigurationError::ArityMismatch { .. }
    ));
    assert!(matches!(
        build_model(&d, &v, &[World::new(["tea", "lab", "bob"], 1.0)], &r).unwrap_err(),
        ConfigurationError::ValueOutsideDomain { .. }
    ));
    assert!(matches!(
        build_model(&d, &v, &[World::new(["coffee", "lab", "bob"], -1.0)], &r).unwrap_err(),
        ConfigurationError::NegativeWeight { .. }
    ));
    assert_eq!(
        build_model(&d, &v, &[World::new(["coffee", "lab", "bob"], 0.0)], &r).unwrap_err(),
        ConfigurationError::ZeroTotalWeight
    );
    assert!(matches!(
        build_model(&d, &["colour".to_string()], &worlds(), &r).unwrap_err(),
        ConfigurationError::UnknownWorldVariable { .. }
    ));
}

#[test]
fn model_file_name_is_content_addressed() {
    let dir = tempfile::tempdir().unwrap();
    let model = build_model(&domain(), &vars(), &worlds(), &RewardParams::default()).unwrap();
    let path = write_model_file(&model, dir.path(), "shopping").unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert_eq!(name, format!("shopping-{}.POMDP", model.fingerprint()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), to_solver_format(&model));

    let other = build_model(
        &domain(),
        &vars(),
        &worlds(),
        &RewardParams::new(-1.0, -1.0, 1.0, -1.0),
    )
    .unwrap();
    assert_ne!(model.fingerprint(), other.fingerprint());
}
