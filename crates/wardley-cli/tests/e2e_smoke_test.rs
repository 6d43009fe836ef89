use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use wardley_cli::{Args, Command, run};

/// Demo maps live at the workspace root, not in the crate
fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all files with the given extension from a directory
fn collect_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = if let Ok(entries) = fs::read_dir(dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some(extension)
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(command: Command) -> Args {
    Args {
        command,
        config: None,
        log_level: "off".to_string(),
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let valid_demos = collect_files(&demos_dir(), "wm");

    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let formatted_path = temp_dir.path().join(demo_path.file_name().unwrap());

        let steps = [
            Command::Check {
                input: path_string(demo_path),
            },
            Command::Fmt {
                input: path_string(demo_path),
                output: Some(path_string(&formatted_path)),
                check: false,
            },
            // The formatted output is itself canonical
            Command::Fmt {
                input: path_string(&formatted_path),
                output: None,
                check: true,
            },
        ];

        for step in steps {
            if let Err(e) = run(&args(step)) {
                failed_demos.push((demo_path.clone(), e));
                break;
            }
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let error_demos = collect_files(&demos_dir().join("errors"), "wm");

    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let unexpectedly_succeeded: Vec<&PathBuf> = error_demos
        .iter()
        .filter(|demo_path| {
            run(&args(Command::Check {
                input: path_string(demo_path),
            }))
            .is_ok()
        })
        .collect();

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_fmt_check_rejects_unformatted_file() {
    let result = run(&args(Command::Fmt {
        input: path_string(&demos_dir().join("dialect.wm")),
        output: None,
        check: true,
    }));

    assert!(result.is_err(), "dialect.wm has comments and is not canonical");
}

#[test]
fn e2e_generate_from_snapshot() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("tea_shop.wm");

    run(&args(Command::Generate {
        input: path_string(&demos_dir().join("tea_shop.json")),
        output: Some(path_string(&output_path)),
    }))
    .expect("Failed to generate");

    let text = fs::read_to_string(&output_path).unwrap();
    assert!(text.starts_with("title Tea Shop\n\nanchor Business [0.95, 0.63]\n"));
    assert!(text.ends_with("Cup of Tea->Kettle\n"));
}

#[test]
fn e2e_plan_and_apply_against_snapshot() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let plan_path = temp_dir.path().join("plan.json");
    let state_path = temp_dir.path().join("state.json");
    let demo = path_string(&demos_dir().join("tea_shop.wm"));
    let snapshot = path_string(&demos_dir().join("tea_shop.json"));

    run(&args(Command::Plan {
        input: demo.clone(),
        state: snapshot.clone(),
        apply: false,
        output: Some(path_string(&plan_path)),
    }))
    .expect("Failed to plan");

    let plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&plan_path).unwrap()).unwrap();
    // Public, Cup, Hot Water, Water and Power are not stored yet
    assert_eq!(plan["create_nodes"].as_array().unwrap().len(), 5);
    assert!(plan["delete_nodes"].as_array().unwrap().is_empty());

    run(&args(Command::Plan {
        input: demo.clone(),
        state: snapshot,
        apply: true,
        output: Some(path_string(&state_path)),
    }))
    .expect("Failed to apply");

    // The applied state needs no further changes
    run(&args(Command::Plan {
        input: demo,
        state: path_string(&state_path),
        apply: false,
        output: Some(path_string(&plan_path)),
    }))
    .expect("Failed to re-plan");

    let replan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&plan_path).unwrap()).unwrap();
    for key in [
        "update_nodes",
        "create_nodes",
        "delete_nodes",
        "create_edges",
        "delete_edges",
    ] {
        assert!(replan[key].as_array().unwrap().is_empty(), "{key}: {replan}");
    }
}
