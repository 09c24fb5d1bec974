use std::thread;

use clarify::execution::AnswerChannel;
use clarify::{
    build_model, ChannelAnswerSource, ClarifyError, ConsoleAnswerSource, ExecutionLoop,
    ModelSpec, NavigationError, Policy, PolicyShape, RewardParams, ScriptedAnswerSource,
    VariableDomain, World,
};

// Actions: 0 which_item, 1 which_room, 2 is_item_book, 3 is_item_cup,
// 4 is_room_kitchen, 5 is_room_office, 6 deliver_cup_office,
// 7 deliver_book_kitchen, 8 deliver_cup_kitchen.
// Observations: 0 none, 1 yes, 2 no, 3 book, 4 cup, 5 kitchen, 6 office.
fn fixture() -> (ModelSpec, VariableDomain) {
    let domain = VariableDomain::parse("item:book,cup\nroom:kitchen,office\n").unwrap();
    let worlds = vec![
        World::new(["cup", "office"], 2.0),
        World::new(["book", "kitchen"], 1.0),
        World::new(["cup", "kitchen"], 1.0),
    ];
    let model = build_model(
        &domain,
        &["item".to_string(), "room".to_string()],
        &worlds,
        &RewardParams::default(),
    )
    .unwrap();
    (model, domain)
}

// which_item; book -> deliver book_kitchen, cup -> is_room_office;
// yes -> deliver cup_office, no -> deliver cup_kitchen.
const GRAPH: &str = "\
0 0 - - - 1 2 - -
1 7 - - - - - - -
2 5 - 3 4 - - - -
3 6 - - - - - - -
4 8 - - - - - - -
";

const ALPHA: &str = "\
0
0 30 10 10
7
0 -100 50 -100
5
0 40 -100 20
6
0 50 -100 -100
8
0 -100 -100 50
";

fn policy(model: &ModelSpec) -> Policy {
    Policy::from_artifacts(GRAPH, ALPHA, &model.belief(), PolicyShape::from(model)).unwrap()
}

#[test]
fn terminates_after_k_questions() {
    let (model, domain) = fixture();
    let policy = policy(&model);
    let run = |answers: &[&str]| {
        let mut source = ScriptedAnswerSource::new(answers.iter().copied());
        ExecutionLoop::new(&model, &domain, &policy).run(&mut source)
    };

    let delivery = run(&["book"]).unwrap();
    assert_eq!(delivery.action_name, "deliver_book_kitchen");
    assert_eq!(delivery.steps, 1);

    let delivery = run(&["cup", "yes"]).unwrap();
    assert_eq!(delivery.target_state, "cup_office");
    assert_eq!(delivery.steps, 2);

    let delivery = run(&["cup", "no"]).unwrap();
    assert_eq!(delivery.action_index, 8);
    assert_eq!(
        delivery
            .transcript
            .iter()
            .map(|e| e.observation)
            .collect::<Vec<_>>(),
        vec![4, 2]
    );
}

#[test]
fn unusable_answers_are_re_asked() {
    let (model, domain) = fixture();
    let policy = policy(&model);
    let input = std::io::Cursor::new("tea\n  cup \nsure\nyes\n");
    let mut console = ConsoleAnswerSource::new(input, Vec::new());

    let delivery = ExecutionLoop::new(&model, &domain, &policy)
        .run(&mut console)
        .unwrap();
    assert_eq!(delivery.action_name, "deliver_cup_office");

    let printed = String::from_utf8(console.into_output()).unwrap();
    assert_eq!(
        printed,
        "Which item should be delivered?\n\
         Invalid answer\n\
         Which item should be delivered?\n\
         Is this delivery for office?\n\
         Answer must be yes or no\n\
         Is this delivery for office?\n"
    );
}

#[test]
fn retry_bound_abandons_the_episode() {
    let (model, domain) = fixture();
    let policy = policy(&model);
    let mut source = ScriptedAnswerSource::new(["tea", "juice", "cup"]);
    let err = ExecutionLoop::new(&model, &domain, &policy)
        .max_answer_attempts(2)
        .run(&mut source)
        .unwrap_err();
    assert!(matches!(
        err,
        ClarifyError::Navigation(NavigationError::RetriesExhausted { attempts: 2 })
    ));
}

#[test]
fn pruned_branch_halts_with_missing_edge() {
    let (model, domain) = fixture();
    // `no` branch of node 2 was pruned by the solver.
    let graph = GRAPH.replace("2 5 - 3 4", "2 5 - 3 -");
    let policy =
        Policy::from_artifacts(&graph, ALPHA, &model.belief(), PolicyShape::from(&model)).unwrap();
    let mut source = ScriptedAnswerSource::new(["cup", "no"]);
    let err = ExecutionLoop::new(&model, &domain, &policy)
        .run(&mut source)
        .unwrap_err();
    assert!(matches!(
        err,
        ClarifyError::Navigation(NavigationError::MissingEdge {
            node: 2,
            observation: 2
        })
    ));
}

#[test]
fn episode_driven_from_another_thread() {
    let (model, domain) = fixture();
    let policy = policy(&model);
    let (mut source, remote) = ChannelAnswerSource::pair();

    let answerer = thread::spawn(move || {
        let AnswerChannel { questions, answers } = remote;
        let mut asked = Vec::new();
        for question in questions {
            let reply = if question.accepted.contains(&"cup".to_string()) {
                "cup"
            } else {
                "yes"
            };
            asked.push(question.text);
            if answers.send(reply.to_string()).is_err() {
                break;
            }
        }
        asked
    });

    let delivery = ExecutionLoop::new(&model, &domain, &policy)
        .run(&mut source)
        .unwrap();
    drop(source);

    let asked = answerer.join().unwrap();
    assert_eq!(delivery.action_name, "deliver_cup_office");
    assert_eq!(
        asked,
        ["Which item should be delivered?", "Is this delivery for office?"]
    );
}

#[test]
fn closed_channel_abandons_the_episode() {
    let (model, domain) = fixture();
    let policy = policy(&model);
    let (mut source, remote) = ChannelAnswerSource::pair();
    drop(remote);
    let err = ExecutionLoop::new(&model, &domain, &policy)
        .run(&mut source)
        .unwrap_err();
    assert!(matches!(
        err,
        ClarifyError::Navigation(NavigationError::AnswerSourceClosed)
    ));
}
