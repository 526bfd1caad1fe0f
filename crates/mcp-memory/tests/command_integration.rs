//! End-to-end tests driving the store through raw tool requests.

use mcp_memory::{MemoryCommand, MemoryConfig, MemoryError, MemoryRequest, MemoryStore};
use serde_json::{Value, json};
use tempfile::TempDir;

fn setup() -> (TempDir, MemoryStore) {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::new(&MemoryConfig::new(temp.path().join("memories")));
    (temp, store)
}

fn run(store: &MemoryStore, args: Value) -> Result<String, MemoryError> {
    let request: MemoryRequest = serde_json::from_value(args).unwrap();
    store.execute(MemoryCommand::try_from(request)?)
}

#[test]
fn test_create_view_roundtrip() {
    let (_temp, store) = setup();

    let out = run(
        &store,
        json!({"command": "create", "path": "/memories/notes.md", "file_text": "# Notes\nfirst"}),
    )
    .unwrap();
    assert_eq!(out, "Created: /memories/notes.md");

    let content = run(&store, json!({"command": "view", "path": "/memories/notes.md"})).unwrap();
    assert_eq!(content, "# Notes\nfirst");
}

#[test]
fn test_create_without_text_is_empty_file() {
    let (_temp, store) = setup();

    run(&store, json!({"command": "create", "path": "/memories/blank.md"})).unwrap();
    let content = run(&store, json!({"command": "view", "path": "/memories/blank.md"})).unwrap();
    assert_eq!(content, "");
}

#[test]
fn test_view_range_single_line_file() {
    let (_temp, store) = setup();
    run(
        &store,
        json!({"command": "create", "path": "/memories/one.md", "file_text": "only line"}),
    )
    .unwrap();

    let out = run(
        &store,
        json!({"command": "view", "path": "/memories/one.md", "view_range": [1, 1]}),
    )
    .unwrap();
    assert_eq!(out, "only line");
}

#[test]
fn test_view_range_clamps_to_line_count() {
    let (_temp, store) = setup();
    run(
        &store,
        json!({"command": "create", "path": "/memories/n.md", "file_text": "l1\nl2\nl3\nl4\nl5"}),
    )
    .unwrap();

    let out = run(
        &store,
        json!({"command": "view", "path": "/memories/n.md", "view_range": [4, 50]}),
    )
    .unwrap();
    assert_eq!(out, "l4\nl5");
}

#[test]
fn test_listing_three_entries() {
    let (_temp, store) = setup();
    run(&store, json!({"command": "create", "path": "/memories/a.md", "file_text": "a"})).unwrap();
    run(
        &store,
        json!({"command": "create", "path": "/memories/b/c.md", "file_text": "c"}),
    )
    .unwrap();

    let listing = run(&store, json!({"command": "view", "path": "/memories"})).unwrap();
    let entries: Vec<&str> = listing.lines().collect();

    assert_eq!(
        entries,
        vec!["/memories/a.md", "/memories/b/", "/memories/b/c.md"]
    );
}

#[test]
fn test_listing_is_stable_across_calls() {
    let (_temp, store) = setup();
    for name in ["z.md", "m/1.md", "m/0.md", "a/deep/x.md"] {
        run(
            &store,
            json!({"command": "create", "path": format!("/memories/{name}")}),
        )
        .unwrap();
    }

    let first = run(&store, json!({"command": "view", "path": "/memories"})).unwrap();
    let second = run(&store, json!({"command": "view", "path": "/memories"})).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 7);
}

#[test]
fn test_empty_root_returns_sentinel() {
    let (_temp, store) = setup();
    let out = run(&store, json!({"command": "view", "path": "/memories/"})).unwrap();
    assert_eq!(out, "Directory is empty: /memories");
}

#[test]
fn test_str_replace_then_absent_needle() {
    let (_temp, store) = setup();
    run(
        &store,
        json!({"command": "create", "path": "/memories/s.md", "file_text": "aXbXc"}),
    )
    .unwrap();

    run(
        &store,
        json!({"command": "str_replace", "path": "/memories/s.md", "old_str": "X", "new_str": "Y"}),
    )
    .unwrap();
    let content = run(&store, json!({"command": "view", "path": "/memories/s.md"})).unwrap();
    assert_eq!(content, "aYbXc");

    run(
        &store,
        json!({"command": "create", "path": "/memories/s.md", "file_text": "aXbXc"}),
    )
    .unwrap();
    let err = run(
        &store,
        json!({"command": "str_replace", "path": "/memories/s.md", "old_str": "Q", "new_str": "Y"}),
    )
    .unwrap_err();
    assert!(err.is_not_matched());
}

#[test]
fn test_insert_second_line() {
    let (_temp, store) = setup();
    run(
        &store,
        json!({"command": "create", "path": "/memories/i.md", "file_text": "a\nb\nc"}),
    )
    .unwrap();

    run(
        &store,
        json!({
            "command": "insert",
            "path": "/memories/i.md",
            "insert_line": 2,
            "insert_text": "NEW"
        }),
    )
    .unwrap();
    let content = run(&store, json!({"command": "view", "path": "/memories/i.md"})).unwrap();
    assert_eq!(content, "a\nNEW\nb\nc");
}

#[test]
fn test_insert_missing_file() {
    let (_temp, store) = setup();
    let err = run(
        &store,
        json!({
            "command": "insert",
            "path": "/memories/nope.md",
            "insert_line": 1,
            "insert_text": "x"
        }),
    )
    .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_delete_directory_removes_descendants() {
    let (_temp, store) = setup();
    for path in ["/memories/d/a.md", "/memories/d/e/b.md"] {
        run(&store, json!({"command": "create", "path": path, "file_text": "x"})).unwrap();
    }

    let out = run(&store, json!({"command": "delete", "path": "/memories/d"})).unwrap();
    assert_eq!(out, "Deleted directory: /memories/d");

    for path in ["/memories/d/a.md", "/memories/d/e/b.md", "/memories/d/e"] {
        let err = run(&store, json!({"command": "view", "path": path})).unwrap_err();
        assert!(err.is_not_found(), "{path} should be gone");
    }
}

#[test]
fn test_rename_then_view() {
    let (_temp, store) = setup();
    run(
        &store,
        json!({"command": "create", "path": "/memories/draft.md", "file_text": "body"}),
    )
    .unwrap();

    let out = run(
        &store,
        json!({
            "command": "rename",
            "old_path": "/memories/draft.md",
            "new_path": "/memories/final/doc.md"
        }),
    )
    .unwrap();
    assert_eq!(out, "Renamed: /memories/draft.md -> /memories/final/doc.md");

    let content = run(
        &store,
        json!({"command": "view", "path": "/memories/final/doc.md"}),
    )
    .unwrap();
    assert_eq!(content, "body");
    let err = run(&store, json!({"command": "view", "path": "/memories/draft.md"})).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_rename_directory() {
    let (_temp, store) = setup();
    run(
        &store,
        json!({"command": "create", "path": "/memories/old/x.md", "file_text": "x"}),
    )
    .unwrap();

    run(
        &store,
        json!({"command": "rename", "old_path": "/memories/old", "new_path": "/memories/new"}),
    )
    .unwrap();

    let listing = run(&store, json!({"command": "view", "path": "/memories"})).unwrap();
    assert_eq!(listing, "/memories/new/\n/memories/new/x.md");
}

#[test]
fn test_missing_arguments_reported_per_command() {
    let (_temp, store) = setup();
    let cases = [
        (json!({"command": "view"}), "path"),
        (json!({"command": "create"}), "path"),
        (json!({"command": "str_replace", "path": "/memories/a.md", "new_str": "y"}), "old_str"),
        (json!({"command": "insert", "path": "/memories/a.md", "insert_text": "y"}), "insert_line"),
        (json!({"command": "insert", "path": "/memories/a.md", "insert_line": 1}), "insert_text"),
        (json!({"command": "delete"}), "path"),
        (json!({"command": "rename", "new_path": "/memories/b.md"}), "old_path"),
    ];

    for (args, argument) in cases {
        let err = run(&store, args.clone()).unwrap_err();
        match err {
            MemoryError::MissingArgument { argument: missing, .. } => {
                assert_eq!(missing, argument, "wrong argument reported for {args}");
            }
            other => panic!("expected MissingArgument for {args}, got {other}"),
        }
    }
}

#[test]
fn test_errors_mention_virtual_paths_only() {
    let (temp, store) = setup();
    let err = run(&store, json!({"command": "view", "path": "/memories/missing.md"})).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("/memories/missing.md"));
    assert!(!message.contains(&temp.path().display().to_string()));
}

#[test]
fn test_concurrent_views_never_see_torn_writes() {
    let (_temp, store) = setup();
    let small = "a".repeat(64);
    let large = "b".repeat(256 * 1024);
    run(
        &store,
        json!({"command": "create", "path": "/memories/race.md", "file_text": &small}),
    )
    .unwrap();

    std::thread::scope(|scope| {
        let writer = scope.spawn(|| {
            for i in 0..20 {
                let text = if i % 2 == 0 { &large } else { &small };
                run(
                    &store,
                    json!({"command": "create", "path": "/memories/race.md", "file_text": text}),
                )
                .unwrap();
            }
        });

        for _ in 0..50 {
            let content =
                run(&store, json!({"command": "view", "path": "/memories/race.md"})).unwrap();
            assert!(content == small || content == large, "torn read of {} bytes", content.len());
        }

        writer.join().unwrap();
    });
}
