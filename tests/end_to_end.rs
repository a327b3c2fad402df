use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use storyline::{
    writer::{Basic, Cli, Coloring, WritableString},
    Error, Event, Feature, Narrative, Runner, Scenario, ScenarioContext, Status, Story, Tree,
    WriterExt as _,
};

fn scenario(id: &str, ok: bool, delay_ms: u64) -> ScenarioContext {
    ScenarioContext::of(
        Scenario::builder(format!("{id} scenario"))
            .id(id)
            .given("the shop is open", move || thread::sleep(Duration::from_millis(delay_ms)))
            .then("the order is accepted", move || ok)
            .build(),
    )
}

fn shop() -> Feature {
    let s1 = Story::builder("Pay by card")
        .id("s1")
        .narrative(Narrative::new("buy things", "customer", "to pay by card"))
        .scenarios([scenario("s1a", true, 30), scenario("s1b", true, 0)])
        .build();
    let s2 = Story::builder("Pay by cash")
        .id("s2")
        .scenarios([scenario("s2a", true, 0), scenario("s2b", false, 20)])
        .build();
    Feature::builder("Shop").id("f").story(s1).story(s2).build()
}

fn statuses(feature: &Feature) -> (Status, Vec<Status>) {
    (feature.status(), feature.stories().iter().map(Story::status).collect())
}

#[tokio::test]
async fn concurrent_run_rolls_up_feature() {
    let ran = Runner::new().run_feature(shop()).await.unwrap();

    assert_eq!(statuses(&ran), (Status::Failed, vec![Status::Passed, Status::Failed]));
    let s2 = &ran.stories()[1];
    let scenarios =
        s2.scenario_contexts().iter().map(ScenarioContext::status).collect::<Vec<_>>();
    assert_eq!(scenarios, [Status::Passed, Status::Failed]);
}

#[tokio::test]
async fn outcome_does_not_depend_on_concurrency() {
    let sequential = Runner::new().run_feature_sync(shop()).unwrap();
    let one_by_one =
        Runner::new().max_concurrent_scenarios(1).run_feature(shop()).await.unwrap();
    let unbounded =
        Runner::new().max_concurrent_scenarios(None).run_feature(shop()).await.unwrap();

    assert_eq!(statuses(&sequential), statuses(&one_by_one));
    assert_eq!(statuses(&sequential), statuses(&unbounded));
}

#[tokio::test]
async fn respects_concurrency_limit() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let tracked = |id: String| {
        let (running, peak) = (Arc::clone(&running), Arc::clone(&peak));
        ScenarioContext::of(
            Scenario::builder(id.clone())
                .id(id)
                .given("a slow step", move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    _ = peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    _ = running.fetch_sub(1, Ordering::SeqCst);
                })
                .build(),
        )
    };
    let story = Story::builder("Busy")
        .id("busy")
        .scenarios((0..8).map(|n| tracked(format!("sc{n}"))))
        .build();

    let ran = Runner::new().max_concurrent_scenarios(2).run_story(story).await.unwrap();

    assert_eq!(ran.status(), Status::Passed);
    assert!(peak.load(Ordering::SeqCst) <= 2, "peak {}", peak.load(Ordering::SeqCst));
}

#[tokio::test]
async fn events_report_every_node_once() {
    let mut events = Vec::new();
    let trees = Runner::new().run_with([Tree::from(shop())], &mut events).await.unwrap();

    assert_eq!(trees[0].status(), Status::Failed);
    assert!(matches!(events.first(), Some(Event::Started { scenarios: 4 })));
    assert!(matches!(events.last(), Some(Event::Finished)));

    let count = |f: fn(&Event) -> bool| events.iter().filter(|ev| f(ev)).count();
    assert_eq!(count(|ev| matches!(ev, Event::Step { .. })), 8);
    assert_eq!(count(|ev| matches!(ev, Event::Scenario(_))), 4);
    assert_eq!(count(|ev| matches!(ev, Event::Story(_))), 2);
    assert_eq!(count(|ev| matches!(ev, Event::Feature(_))), 1);

    let feature_at = events.iter().position(|ev| matches!(ev, Event::Feature(_))).unwrap();
    assert_eq!(feature_at, events.len() - 2);
}

#[tokio::test]
async fn renders_report_with_summary() {
    let cli = Cli { color: Coloring::Never, realtime_steps: false };
    let mut writer = Basic::new(WritableString::default(), &cli).summarized();

    _ = Runner::new().run_with([Tree::from(shop())], &mut writer).await.unwrap();

    assert!(writer.stats().execution_has_failed());
    let out = writer.into_inner().into_inner().0;
    assert!(
        out.starts_with(
            "Feature f: Shop: FAILED\n\
             \tFeature f - Story s1: Pay by card: PASSED\n\
             \tIn order to buy things\n\
             \tAs a customer\n\
             \tI to pay by card\n\
             \t\tFeature f - Story s1 - Scenario s1a: s1a scenario\n\
             \t\t\tGiven the shop is open: PASSED\n\
             \t\t\tThen the order is accepted: PASSED\n",
        ),
        "{out}",
    );
    assert!(out.contains("\t\t\tThen the order is accepted: FAILED\n"), "{out}");
    assert!(
        out.ends_with(
            "[Summary]\n\
             1 feature (1 failed)\n\
             2 stories (1 passed, 1 failed)\n\
             4 scenarios (3 passed, 1 failed)\n\
             8 steps (7 passed, 1 failed)\n",
        ),
        "{out}",
    );
}

#[tokio::test]
async fn rejects_duplicates_before_execution() {
    let executed = Arc::new(AtomicUsize::new(0));
    let counted = {
        let executed = Arc::clone(&executed);
        ScenarioContext::of(
            Scenario::builder("counted")
                .id("dup")
                .given("counts", move || {
                    _ = executed.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        )
    };
    let feature = Feature::builder("Dup").id("dup").scenarios([counted.clone(), counted]).build();

    let err = Runner::new().run_feature(feature).await.unwrap_err();

    assert!(matches!(err, Error::Config(_)), "{err}");
    assert_eq!(err.to_string(), "Configuration error: Duplicate scenario id 'dup'");
    assert_eq!(executed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn step_errors_and_panics_stay_in_the_tree() {
    let story = Story::builder("Fragile")
        .id("fragile")
        .scenario(ScenarioContext::of(
            Scenario::builder("errors")
                .id("errors")
                .given("an error", || Err::<(), _>("out of stock"))
                .then("skipped", || true)
                .build(),
        ))
        .scenario(ScenarioContext::of(
            Scenario::builder("panics")
                .id("panics")
                .given("a panic", || -> bool { panic!("boom") })
                .build(),
        ))
        .build();

    let ran = Runner::new().run_story(story).await.unwrap();

    assert_eq!(ran.status(), Status::Error);
    let errors = ran.scenario_contexts()[0].resolved().unwrap().steps();
    assert_eq!(errors[0].status(), Status::Error);
    assert_eq!(errors[1].status(), Status::Cancelled);
    assert_eq!(ran.scenario_contexts()[1].status(), Status::Error);
}

#[tokio::test]
async fn standalone_scenario_sharing_an_id_with_a_nested_one() {
    let story = Story::builder("Pay by card").id("card").scenario(scenario("a", false, 0)).build();

    let trees = Runner::new()
        .run([Tree::from(scenario("a", true, 100)), Tree::from(story)])
        .await
        .unwrap();

    let statuses = trees.iter().map(Tree::status).collect::<Vec<_>>();
    assert_eq!(statuses, [Status::Passed, Status::Failed]);
}
