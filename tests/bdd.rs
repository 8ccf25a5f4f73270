use std::{collections::HashMap, fmt, net::SocketAddr, time::Duration};

use anyhow::Context;
use chrono::NaiveDate;
use cucumber::{given, then, when, World as _};
use tempfile::TempDir;
use tripcomm::{
    config::{AppConfig, HashingConfig},
    db::{init_pool, run_migrations},
    error::AppError,
    models::trip::{NewTrip, TripId, TripPatch},
    services::{participants, trips, users},
    state::AppState,
};

#[derive(Debug, cucumber::World, Default)]
struct AppWorld {
    state: Option<TestState>,
    trips: HashMap<String, TripId>,
    last_trip: Option<TripId>,
    outcomes: Vec<Result<(), (String, String)>>,
}

impl AppWorld {
    fn app_state(&self) -> &AppState {
        self.state
            .as_ref()
            .expect("state must be initialised first")
            .app()
    }

    fn trip_id(&self, name: &str) -> TripId {
        *self
            .trips
            .get(name)
            .unwrap_or_else(|| panic!("trip {name} was never created"))
    }

    fn record<T>(&mut self, result: Result<T, AppError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.outcomes.push(Ok(()));
                Some(value)
            }
            Err(err) => {
                self.outcomes
                    .push(Err((err.code().to_string(), err.to_string())));
                None
            }
        }
    }

    fn failures(&self) -> Vec<&(String, String)> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err()).collect()
    }

    async fn roster(&self, trip: &str) -> Result<Vec<String>, AppError> {
        let mut names: Vec<String> = participants::list_participants(self.app_state(), self.trip_id(trip))
            .await?
            .into_iter()
            .map(|p| p.username)
            .collect();
        names.sort();
        Ok(names)
    }
}

struct TestState {
    app: AppState,
    _root: TempDir,
}

impl fmt::Debug for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestState").finish()
    }
}

impl TestState {
    async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for bdd world")?;
        let db_path = root.path().join("bdd.sqlite");
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let config = AppConfig {
            database_url,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            hashing: HashingConfig {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
        };

        let db = init_pool(&config.database_url, config.max_connections, config.busy_timeout).await?;
        run_migrations(&db).await?;

        let app = AppState::new(config, db)?;
        Ok(Self { app, _root: root })
    }

    fn app(&self) -> &AppState {
        &self.app
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date in YYYY-MM-DD form")
}

async fn create_trip(
    world: &mut AppWorld,
    owner: &str,
    name: &str,
    from: &str,
    to: &str,
    participants: &str,
) -> Result<TripId, AppError> {
    let trip = NewTrip {
        trip_name: name.to_string(),
        date_from: date(from),
        date_to: date(to),
        participants: list(participants),
    };
    let trip_id = trips::create_trip(world.app_state(), owner, trip).await?;
    world.trips.insert(name.to_string(), trip_id);
    world.last_trip = Some(trip_id);
    Ok(trip_id)
}

async fn rename(world: &mut AppWorld, user: &str, trip_id: TripId, new_name: String) {
    let patch = TripPatch {
        trip_name: Some(new_name),
        ..TripPatch::default()
    };
    let result = trips::update_trip(world.app_state(), user, trip_id, patch).await;
    world.record(result);
}

#[given("a fresh application state")]
async fn given_fresh_state(world: &mut AppWorld) {
    world.state = Some(TestState::new().await.expect("state"));
    world.trips.clear();
    world.outcomes.clear();
}

#[given(regex = r#"^a user "([^"]+)" with password "([^"]*)"$"#)]
async fn given_user(world: &mut AppWorld, username: String, password: String) {
    users::create_user(world.app_state(), &username, &password)
        .await
        .expect("register user");
}

#[given(regex = r#"^users "([^"]+)" are registered$"#)]
async fn given_users(world: &mut AppWorld, names: String) {
    for name in list(&names) {
        users::create_user(world.app_state(), &name, "secret")
            .await
            .expect("register user");
    }
}

#[given(
    regex = r#"^"([^"]+)" created trip "([^"]+)" from "([^"]+)" to "([^"]+)" with participants "([^"]*)"$"#
)]
async fn given_trip(
    world: &mut AppWorld,
    owner: String,
    name: String,
    from: String,
    to: String,
    participants: String,
) {
    create_trip(world, &owner, &name, &from, &to, &participants)
        .await
        .expect("create trip");
}

#[when(regex = r#"^I register "([^"]+)" with password "([^"]*)"$"#)]
async fn when_register(world: &mut AppWorld, username: String, password: String) {
    let result = users::create_user(world.app_state(), &username, &password).await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" changes password from "([^"]*)" to "([^"]*)"$"#)]
async fn when_change_password(world: &mut AppWorld, username: String, current: String, new: String) {
    let result = users::change_password(world.app_state(), &username, &current, &new).await;
    world.record(result);
}

#[when(regex = r#"^user "([^"]+)" is deleted$"#)]
async fn when_delete_user(world: &mut AppWorld, username: String) {
    let result = users::delete_user(world.app_state(), &username).await;
    world.record(result);
}

#[when(
    regex = r#"^"([^"]+)" creates trip "([^"]+)" from "([^"]+)" to "([^"]+)" with participants "([^"]*)"$"#
)]
async fn when_create_trip(
    world: &mut AppWorld,
    owner: String,
    name: String,
    from: String,
    to: String,
    participants: String,
) {
    let result = create_trip(world, &owner, &name, &from, &to, &participants).await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" deletes trip "([^"]+)"$"#)]
async fn when_delete_trip(world: &mut AppWorld, user: String, trip: String) {
    let trip_id = world.trip_id(&trip);
    let result = trips::delete_trip(world.app_state(), &user, trip_id).await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" renames trip "([^"]+)" to "([^"]+)"$"#)]
async fn when_rename_trip(world: &mut AppWorld, user: String, trip: String, new_name: String) {
    let trip_id = world.trip_id(&trip);
    rename(world, &user, trip_id, new_name).await;
}

#[when(regex = r#"^"([^"]+)" renames trip id (\d+) to "([^"]+)"$"#)]
async fn when_rename_trip_id(world: &mut AppWorld, user: String, trip_id: TripId, new_name: String) {
    rename(world, &user, trip_id, new_name).await;
}

#[when(regex = r#"^"([^"]+)" adds participants "([^"]*)" to trip "([^"]+)"$"#)]
async fn when_add_participants(world: &mut AppWorld, user: String, names: String, trip: String) {
    let trip_id = world.trip_id(&trip);
    let result =
        participants::add_participants(world.app_state(), &user, trip_id, &list(&names)).await;
    world.record(result);
}

#[when(regex = r#"^"([^"]+)" removes participants "([^"]*)" from trip "([^"]+)"$"#)]
async fn when_remove_participants(world: &mut AppWorld, user: String, names: String, trip: String) {
    let trip_id = world.trip_id(&trip);
    let result =
        participants::remove_participants(world.app_state(), &user, trip_id, &list(&names)).await;
    world.record(result);
}

#[then("the operation succeeds")]
async fn then_succeeds(world: &mut AppWorld) {
    let last = world.outcomes.last().expect("an operation must have run");
    assert!(last.is_ok(), "expected success, got {last:?}");
}

#[then(regex = r#"^the operation fails with "([^"]+)"$"#)]
async fn then_fails_with(world: &mut AppWorld, code: String) {
    match world.outcomes.last().expect("an operation must have run") {
        Err((actual, _)) => assert_eq!(actual, &code),
        Ok(()) => panic!("expected failure {code}, got success"),
    }
}

#[then("the last two failures are identical")]
async fn then_failures_identical(world: &mut AppWorld) {
    let failures = world.failures();
    assert!(failures.len() >= 2, "need two failures, got {failures:?}");
    assert_eq!(failures[failures.len() - 1], failures[failures.len() - 2]);
}

#[then(regex = r#"^there is exactly (\d+) users? named "([^"]+)"$"#)]
async fn then_user_count(world: &mut AppWorld, expected: usize, username: String) {
    let all = users::list_users(world.app_state()).await.expect("list users");
    assert_eq!(all.iter().filter(|u| **u == username).count(), expected);
}

#[then(regex = r#"^"([^"]+)" can authenticate with "([^"]*)"$"#)]
async fn then_can_authenticate(world: &mut AppWorld, username: String, password: String) {
    users::authenticate(world.app_state(), &username, &password)
        .await
        .expect("authentication");
}

#[then(regex = r#"^authenticating "([^"]+)" with "([^"]*)" fails with "([^"]+)"$"#)]
async fn then_authentication_fails(world: &mut AppWorld, username: String, password: String, code: String) {
    let err = users::authenticate(world.app_state(), &username, &password)
        .await
        .expect_err("authentication should fail");
    assert_eq!(err.code(), code);
}

#[then(regex = r"^the new trip has id (\d+)$")]
async fn then_trip_id(world: &mut AppWorld, expected: TripId) {
    assert_eq!(world.last_trip, Some(expected));
}

#[then(regex = r#"^trip "([^"]+)" has participants "([^"]*)"$"#)]
async fn then_roster(world: &mut AppWorld, trip: String, names: String) {
    let mut expected = list(&names);
    expected.sort();
    assert_eq!(world.roster(&trip).await.expect("roster"), expected);
}

#[then(regex = r#"^trip "([^"]+)" still exists$"#)]
async fn then_trip_exists(world: &mut AppWorld, trip: String) {
    world.roster(&trip).await.expect("trip should still exist");
}

#[then(regex = r#"^trip "([^"]+)" no longer exists$"#)]
async fn then_trip_gone(world: &mut AppWorld, trip: String) {
    let err = world.roster(&trip).await.expect_err("trip should be gone");
    assert_eq!(err.code(), "unknown_trip");
}

#[then(regex = r#"^"([^"]+)" can join the chat of trip "([^"]+)"$"#)]
async fn then_can_join(world: &mut AppWorld, user: String, trip: String) {
    let allowed = participants::can_join_chat(world.app_state(), &user, world.trip_id(&trip))
        .await
        .expect("chat check");
    assert!(allowed);
}

#[then(regex = r#"^"([^"]+)" cannot join the chat of trip "([^"]+)"$"#)]
async fn then_cannot_join(world: &mut AppWorld, user: String, trip: String) {
    let allowed = participants::can_join_chat(world.app_state(), &user, world.trip_id(&trip))
        .await
        .expect("chat check");
    assert!(!allowed);
}

#[then(regex = r#"^no trip is owned by "([^"]+)"$"#)]
async fn then_no_owned_trips(world: &mut AppWorld, username: String) {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trips WHERE owner_name = ?1")
        .bind(&username)
        .fetch_one(&world.app_state().db)
        .await
        .expect("count trips");
    assert_eq!(count, 0);
}

#[then(regex = r#"^no participant row references "([^"]+)"$"#)]
async fn then_no_memberships(world: &mut AppWorld, username: String) {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE username = ?1")
        .bind(&username)
        .fetch_one(&world.app_state().db)
        .await
        .expect("count participants");
    assert_eq!(count, 0);
}

#[tokio::main]
async fn main() {
    AppWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
