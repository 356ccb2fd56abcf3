//! Behaviour-driven step definitions driving the CLI scenarios.

use super::helpers::{Workspace, parse_output, read_roster};
use super::*;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tourdesk_core::{AssignmentStatus, TourId, test_support::sample_roster};

struct CliWorld {
    workspace: RefCell<Option<Workspace>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl CliWorld {
    fn new() -> Self {
        Self {
            workspace: RefCell::new(None),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn with_workspace<T>(&self, f: impl FnOnce(&Workspace) -> T) -> T {
        let borrowed = self.workspace.borrow();
        f(borrowed.as_ref().expect("workspace prepared"))
    }

    /// Run `tourdesk` with `args`, keeping only this invocation's output.
    fn run(&self, args: &[String]) {
        let argv = std::iter::once("tourdesk".to_owned()).chain(args.iter().cloned());
        let mut buffer = self.stdout.borrow_mut();
        buffer.clear();
        let outcome = Cli::try_parse_from(argv)
            .map_err(CliError::from)
            .and_then(|cli| run_command(cli.command, &mut *buffer));
        self.result.replace(Some(outcome));
    }

    fn run_on_snapshot(&self, args: &[&str]) {
        let roster = self.with_workspace(|workspace| workspace.roster());
        let mut argv: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        argv.extend([format!("--{ARG_ROSTER}"), roster.into_string()]);
        self.run(&argv);
    }

    fn expect_error(&self) -> String {
        let borrowed = self.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        error.to_string()
    }
}

#[fixture]
fn world() -> CliWorld {
    CliWorld::new()
}

#[given("a roster snapshot of the sample agency")]
fn sample_snapshot(#[from(world)] world: &CliWorld) {
    world.workspace.replace(Some(Workspace::new()));
}

#[when("I list tours from the snapshot")]
fn list_tours(#[from(world)] world: &CliWorld) {
    world.run_on_snapshot(&["tours"]);
}

#[when("I assign guide g1 to tour 5")]
fn assign_g1(#[from(world)] world: &CliWorld) {
    world.run_on_snapshot(&["assign", "guide", "g1", "--tour", "5"]);
}

#[when("I assign driver d1 to tour 5")]
fn assign_d1(#[from(world)] world: &CliWorld) {
    world.run_on_snapshot(&["assign", "driver", "d1", "--tour", "5"]);
}

#[when("I assign vehicle v2 to tour 5")]
fn assign_v2(#[from(world)] world: &CliWorld) {
    world.run_on_snapshot(&["assign", "vehicle", "v2", "--tour", "5"]);
}

#[when("I assign driver d2 to tour 5")]
fn assign_d2(#[from(world)] world: &CliWorld) {
    world.run_on_snapshot(&["assign", "driver", "d2", "--tour", "5"]);
}

#[when("I list tours without naming a store")]
fn list_without_store(#[from(world)] world: &CliWorld) {
    world.run(&["tours".to_owned()]);
}

#[when("I import the snapshot into a database")]
fn import_snapshot(#[from(world)] world: &CliWorld) {
    let (roster, database) =
        world.with_workspace(|workspace| (workspace.roster(), workspace.database()));
    world.run(&[
        "import".to_owned(),
        format!("--{ARG_ROSTER}"),
        roster.into_string(),
        format!("--{ARG_DATABASE}"),
        database.into_string(),
    ]);
    let borrowed = world.result.borrow();
    let outcome = borrowed.as_ref().expect("result recorded");
    assert!(outcome.is_ok(), "import failed: {outcome:?}");
}

#[when("I list tours from the database")]
fn list_from_database(#[from(world)] world: &CliWorld) {
    let database = world.with_workspace(Workspace::database);
    world.run(&[
        "tours".to_owned(),
        format!("--{ARG_DATABASE}"),
        database.into_string(),
    ]);
}

#[then("the command succeeds")]
fn command_succeeds(#[from(world)] world: &CliWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    assert!(result.is_ok(), "expected success, found {result:?}");
    let output = parse_output(&world.stdout.borrow());
    assert_eq!(output["success"], true);
}

#[then("3 tours are listed with only tour 6 complete")]
fn tours_listed(#[from(world)] world: &CliWorld) {
    let output = parse_output(&world.stdout.borrow());
    let rows = output["data"].as_array().expect("tour rows");
    let summary: Vec<_> = rows
        .iter()
        .map(|row| (row["id"].as_u64(), row["status"].as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Some(5), Some("pending")),
            (Some(6), Some("complete")),
            (Some(7), Some("pending")),
        ]
    );
}

#[then("the snapshot shows tour 5 complete at version 3")]
fn snapshot_complete(#[from(world)] world: &CliWorld) {
    let roster = world.with_workspace(|workspace| read_roster(&workspace.roster()));
    let tour = roster.tour(TourId::new(5)).expect("tour 5 on file");
    assert_eq!(tour.status(), AssignmentStatus::Complete);
    assert_eq!(tour.version, 3);
    assert_eq!(roster.events().len(), 3);
}

#[then("the command fails with \"driver d2 is not available on 2024-06-01: already assigned to tour 6\"")]
fn busy_driver_refused(#[from(world)] world: &CliWorld) {
    let expected = "driver d2 is not available on 2024-06-01: already assigned to tour 6";
    assert_eq!(world.expect_error(), expected);
    let output = parse_output(&world.stdout.borrow());
    assert_eq!(output["success"], false);
    assert_eq!(output["error"], expected);
}

#[then("the snapshot is unchanged")]
fn snapshot_unchanged(#[from(world)] world: &CliWorld) {
    let roster = world.with_workspace(|workspace| read_roster(&workspace.roster()));
    assert_eq!(roster, sample_roster());
}

#[then("the command fails because no store was selected")]
fn no_store(#[from(world)] world: &CliWorld) {
    let borrowed = world.result.borrow();
    match borrowed.as_ref().expect("result recorded") {
        Err(CliError::MissingStore { command }) => assert_eq!(*command, "tours"),
        other => panic!("expected MissingStore, found {other:?}"),
    }
}

macro_rules! register_cli_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/cli.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CliWorld) {
            let _ = world;
        }
    };
}

register_cli_scenario!(cli_lists_tours, "listing tours from a roster snapshot");
register_cli_scenario!(cli_staffs_tour, "staffing a tour one role at a time");
register_cli_scenario!(cli_refuses_busy_driver, "refusing a driver who is busy that day");
register_cli_scenario!(cli_needs_store, "rejecting commands without a store");
#[cfg(feature = "store-sqlite")]
register_cli_scenario!(cli_imports_snapshot, "importing a snapshot into a database");
