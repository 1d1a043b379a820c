//! End-to-end scenarios through `Shell::run_line`
//!
//! Each test drives a fresh shell backed by the in-memory object store and an
//! in-memory history database, the same way the interactive loop does.

use pretty_assertions::assert_eq;
use scm_core::CommandResult;
use scm_core::CommandStatus;
use scm_core::ConfigObject;
use scm_core::ErrorCategory;
use scm_core::HistoryDb;
use scm_core::HistoryQuery;
use scm_core::InMemoryObjectStore;
use scm_core::LineOutcome;
use scm_core::Payload;
use scm_core::Shell;
use scm_core::ShellSettings;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn shell_with_store() -> (Shell, InMemoryObjectStore) {
    let store = InMemoryObjectStore::new();
    let shell = Shell::new(
        "netops",
        Box::new(store.clone()),
        HistoryDb::open_in_memory().expect("history db"),
        &ShellSettings::default(),
    );
    (shell, store)
}

fn run(shell: &mut Shell, line: &str) -> CommandResult {
    match shell.run_line(line) {
        LineOutcome::Executed { result, .. } => result,
        other => panic!("'{line}' was not executed: {other:?}"),
    }
}

fn enter_folder(shell: &mut Shell, folder: &str) {
    assert!(run(shell, "configure").is_success());
    assert!(run(shell, &format!("edit folder {folder}")).is_success());
}

fn listed_names(result: &CommandResult) -> Vec<String> {
    match &result.payload {
        Payload::Objects { objects, .. } => objects.iter().map(|o| o.name().to_string()).collect(),
        other => panic!("expected object listing, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Object lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn address_object_lifecycle() {
    let (mut shell, _) = shell_with_store();
    enter_folder(&mut shell, "Texas");
    assert_eq!(shell.prompt(), "netops(Texas)# ");

    let created = run(
        &mut shell,
        "set address-object name test123 type ip-netmask value 1.1.1.1/32",
    );
    assert_eq!(
        created.summary,
        "Created address-object 'test123' in folder 'Texas'"
    );

    let shown = run(&mut shell, "show address-object test123");
    let Payload::Object(ConfigObject::Address(object)) = shown.payload else {
        panic!("expected an object payload");
    };
    assert_eq!(object.name, "test123");
    assert_eq!(object.value, "1.1.1.1/32");
    assert_eq!(object.address_type.to_string(), "ip-netmask");
    assert_eq!(object.description, "");
    assert!(object.tags.is_empty());

    let deleted = run(&mut shell, "delete address-object test123");
    assert!(deleted.is_success());
    assert_eq!(
        deleted.summary,
        "Deleted address-object 'test123' from folder 'Texas'"
    );

    let missing = run(&mut shell, "show address-object test123");
    assert_eq!(missing.status, CommandStatus::Failure);
    assert_eq!(missing.error, Some(ErrorCategory::NotFound));
}

#[test]
fn partial_update_preserves_unspecified_fields() {
    let (mut shell, _) = shell_with_store();
    enter_folder(&mut shell, "Texas");
    run(
        &mut shell,
        "set address-object name A type ip-netmask value 1.1.1.1/32 tags web,prod",
    );
    let updated = run(&mut shell, r#"set address-object name A description "x""#);
    assert_eq!(updated.summary, "Updated address-object 'A' in folder 'Texas'");

    let Payload::Object(ConfigObject::Address(object)) =
        run(&mut shell, "show address-object A").payload
    else {
        panic!("expected an object payload");
    };
    assert_eq!(object.value, "1.1.1.1/32");
    assert_eq!(object.description, "x");
    assert_eq!(
        object.tags.iter().cloned().collect::<Vec<_>>(),
        vec!["prod", "web"]
    );
}

#[test]
fn create_without_required_fields_fails_without_store_mutation() {
    let (mut shell, store) = shell_with_store();
    enter_folder(&mut shell, "Texas");
    let result = run(&mut shell, "set address-object name lonely type fqdn");
    assert_eq!(result.error, Some(ErrorCategory::ValidationError));
    assert!(result.summary.contains("missing required field: value"));
    assert_eq!(store.mutation_count(), 0);
}

#[test]
fn object_commands_rejected_outside_folder_edit() {
    let (mut shell, store) = shell_with_store();
    assert!(run(&mut shell, "configure").is_success());
    let result = run(&mut shell, "delete address-object web");
    assert_eq!(result.error, Some(ErrorCategory::ModeError));
    assert!(store.calls().is_empty());
    assert_eq!(shell.prompt(), "netops@scm# ");
}

#[test]
fn failed_command_keeps_mode_and_folder() {
    let (mut shell, _) = shell_with_store();
    enter_folder(&mut shell, "Texas");
    let result = run(&mut shell, "set address-object name bad type ip-range value 10.0.0.9");
    assert_eq!(result.error, Some(ErrorCategory::ValidationError));
    assert_eq!(shell.prompt(), "netops(Texas)# ");
}

// ─────────────────────────────────────────────────────────────────────────────
// Filtering
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn filter_clauses_are_conjunctive_and_order_stable() {
    let (mut shell, _) = shell_with_store();
    enter_folder(&mut shell, "Texas");
    for line in [
        "set address-object name web-1 type ip-netmask value 10.0.0.1/32 tags prod",
        "set address-object name web-2 type fqdn value web.example.com tags prod",
        "set address-object name db-1 type ip-netmask value 10.0.1.1/32 tags dev",
        "set address-object name web-3 type ip-netmask value 10.0.0.3/32 tags prod,web",
    ] {
        assert!(run(&mut shell, line).is_success(), "{line}");
    }

    let both = run(
        &mut shell,
        "show address-object-filter --type ip-netmask --tag prod",
    );
    assert_eq!(listed_names(&both), vec!["web-1", "web-3"]);

    let everything = run(&mut shell, "show address-object-filter");
    assert_eq!(
        listed_names(&everything),
        vec!["web-1", "web-2", "db-1", "web-3"]
    );

    let by_name = run(&mut shell, "show address-object-filter --name WEB --value 10.0.0");
    assert_eq!(listed_names(&by_name), vec!["web-1", "web-3"]);

    let no_match = run(&mut shell, "show address-object-filter --tag Prod");
    assert!(listed_names(&no_match).is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// History
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn history_pages_newest_first_and_counts_failures() {
    let (mut shell, _) = shell_with_store();
    enter_folder(&mut shell, "Texas");
    for i in 0..12 {
        run(
            &mut shell,
            &format!("set address-object name host-{i} type ip-netmask value 10.0.0.{i}/32"),
        );
    }
    run(&mut shell, "show address-object ghost");
    run(&mut shell, "frobnicate");

    let result = run(&mut shell, "history --limit 10");
    let Payload::HistoryPage(page) = result.payload else {
        panic!("expected a history page");
    };
    assert_eq!(page.total, 16);
    assert_eq!(page.entries.len(), 10);
    assert_eq!(page.entries[0].command_text, "frobnicate");
    assert_eq!(page.entries[0].status, CommandStatus::Failure);
    assert_eq!(page.entries[1].command_text, "show address-object ghost");
    assert!(page.entries.windows(2).all(|w| w[0].id > w[1].id));

    let texas = shell
        .history()
        .page(&HistoryQuery {
            folder: Some("Texas".to_string()),
            text: Some("HOST-1".to_string()),
            ..HistoryQuery::default()
        })
        .expect("page");
    let texts: Vec<&str> = texas
        .entries
        .iter()
        .map(|e| e.command_text.as_str())
        .collect();
    assert_eq!(
        texts,
        vec![
            "set address-object name host-11 type ip-netmask value 10.0.0.11/32",
            "set address-object name host-10 type ip-netmask value 10.0.0.10/32",
            "set address-object name host-1 type ip-netmask value 10.0.0.1/32",
        ]
    );
}

#[test]
fn history_detail_and_clear() {
    let (mut shell, _) = shell_with_store();
    let id = match shell.run_line("configure") {
        LineOutcome::Executed { history_id, .. } => history_id.expect("recorded"),
        other => panic!("unexpected outcome {other:?}"),
    };

    let detail = run(&mut shell, &format!("history --id {id}"));
    let Payload::HistoryEntry(entry) = detail.payload else {
        panic!("expected a history entry");
    };
    assert_eq!(entry.command_text, "configure");
    assert_eq!(entry.summary, "Entered configuration mode");

    let cleared = run(&mut shell, "history --clear");
    assert!(cleared.summary.starts_with("Cleared 2 history entries"));

    let empty = run(&mut shell, "history");
    let Payload::HistoryPage(page) = empty.payload else {
        panic!("expected a history page");
    };
    assert_eq!(page.total, 0);
    assert!(page.entries.is_empty());

    let zero = run(&mut shell, "history --page 0");
    assert_eq!(zero.error, Some(ErrorCategory::ValidationError));
}

#[test]
fn exit_walks_back_up_and_terminates() {
    let (mut shell, _) = shell_with_store();
    enter_folder(&mut shell, "Texas");
    assert!(!run(&mut shell, "exit").terminate);
    assert_eq!(shell.prompt(), "netops@scm# ");
    assert!(!run(&mut shell, "exit").terminate);
    assert_eq!(shell.prompt(), "netops@scm> ");
    assert!(run(&mut shell, "exit").terminate);
}

#[test]
fn oversized_history_page_is_rejected_without_ending_session() {
    let (mut shell, _) = shell_with_store();
    let result = run(&mut shell, "history --page 4294967295 --limit 4294967295");
    assert_eq!(result.error, Some(ErrorCategory::ValidationError));
    assert!(!result.terminate);
    assert!(run(&mut shell, "history").is_success());
}

#[test]
fn history_text_filter_folds_non_ascii_case() {
    let (mut shell, _) = shell_with_store();
    enter_folder(&mut shell, "Zürich");
    let result = run(&mut shell, "history --filter ZÜRICH");
    let Payload::HistoryPage(page) = result.payload else {
        panic!("expected a history page");
    };
    assert_eq!(page.total, 1);
    assert_eq!(page.entries[0].command_text, "edit folder Zürich");
}
