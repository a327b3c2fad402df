use storyline::{
    cli::{self, Parser as _},
    loader::{self, Component},
    writer::{Basic, WritableString},
    ConfigError, Feature, Narrative, Registry, Runner, Scenario, ScenarioContext, Status, Story,
    Tree,
};

fn scenario(name: &'static str, ok: bool) -> Component {
    ScenarioContext::of(
        Scenario::builder(name)
            .id(name)
            .given("an account", || ())
            .then("it works", move || ok)
            .build(),
    )
    .into()
}

fn registry() -> Registry {
    Registry::new()
        .register("app/features/accounts/feature", |_| {
            Feature::builder("Accounts")
                .id("accounts")
                .narrative(Narrative::new("keep customers", "shop owner", "accounts"))
                .build()
                .into()
        })
        .register("app/features/accounts/scenarios/signup", |_| scenario("signup", true))
        .register("app/features/accounts/stories/login/story", |_| {
            Story::builder("Login").id("login").build().into()
        })
        .register("app/features/accounts/stories/login/scenarios/ok", |_| scenario("ok", true))
        .register("app/features/accounts/stories/login/scenarios/locked", |_| {
            scenario("locked", false)
        })
        .register("app/features/search/feature", |_| {
            Feature::builder("Search").id("search").build().into()
        })
        .register("app/features/search/scenarios/query", |_| scenario("query", true))
}

#[test]
fn loads_whole_tree() {
    let features = loader::load_all::<&str>("app", &[], &registry()).unwrap();

    let ids = features.iter().map(|f| f.id().to_string()).collect::<Vec<_>>();
    assert_eq!(ids, ["accounts", "search"]);

    let accounts = &features[0];
    assert_eq!(accounts.root(), "app/features/accounts");
    assert_eq!(accounts.scenario_contexts().len(), 1);
    assert_eq!(accounts.stories().len(), 1);

    let login = &accounts.stories()[0];
    assert_eq!(login.root(), "app/features/accounts/stories/login");
    assert_eq!(login.feature_id().map(ToString::to_string).as_deref(), Some("accounts"));
    let scenarios = login.scenario_contexts();
    assert_eq!(scenarios.len(), 2);
    assert!(scenarios.iter().all(|ctx| ctx.lineage().depth() == 2));
}

#[test]
fn reports_missing_and_unmatched_features() {
    let err = loader::load_features("elsewhere", &registry()).unwrap_err();
    assert!(matches!(err, ConfigError::NoComponentFound { .. }), "{err}");

    let err = loader::load_all("app", &["accounts", "billing"], &registry()).unwrap_err();
    assert!(matches!(err, ConfigError::NoComponentMatch { .. }), "{err}");
    assert!(err.to_string().contains("billing"), "{err}");
}

#[tokio::test]
async fn runs_features_selected_from_cli() {
    let opts = cli::Opts::<cli::Empty>::try_parse_from([
        "storyline",
        "--root",
        "app",
        "--select",
        "accounts",
        "--concurrency",
        "2",
        "--color",
        "never",
    ])
    .unwrap();

    let features = loader::load_all(&opts.root, &opts.runner.select, &registry()).unwrap();
    assert_eq!(features.len(), 1);

    let mut writer = Basic::new(WritableString::default(), &opts.writer);
    let runner = Runner::new().with_cli(&opts.runner);
    let trees = runner
        .run_with(features.into_iter().map(Tree::Feature), &mut writer)
        .await
        .unwrap();

    assert_eq!(trees[0].status(), Status::Failed);
    let out = writer.into_inner().0;
    assert!(
        out.starts_with(
            "Feature accounts: Accounts: FAILED\n\
             In order to keep customers\n\
             As a shop owner\n\
             I accounts\n\
             \tFeature accounts - Scenario signup: signup\n",
        ),
        "{out}",
    );
    assert!(out.contains("\tFeature accounts - Story login: Login: FAILED\n"), "{out}");
}
