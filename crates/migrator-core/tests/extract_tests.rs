//! End-to-end runs of the test-extraction transformation against fake
//! collaborators.

mod common;

use common::{
    read, read_json, snapshot_tree, write, write_addon, BrokenBlueprint, FakeBlueprint,
    FixedVersion, OfflineRegistry, TEST_SETUP_VERSION,
};
use migrator_core::{codes, extract_tests, Outcome, Phase, Policy, TransformOptions};
use tempfile::tempdir;

fn assert_faulted_at(outcome: &Outcome, expected_phase: Phase, expected_code: &str) {
    match outcome {
        Outcome::Faulted { phase, error } => {
            assert_eq!(*phase, expected_phase);
            assert_eq!(error.code(), expected_code);
        }
        other => panic!("expected fault at {expected_phase}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_extract_in_place() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_addon(root, Some("yarn.lock"));

    let versions = FixedVersion::default();
    let report = extract_tests(TransformOptions::new(root), &versions, FakeBlueprint::default()).await;

    assert!(matches!(report.outcome, Outcome::Completed), "{:?}", report.outcome);
    assert_eq!(
        report.committed,
        vec![
            Phase::Scan,
            Phase::StageSource,
            Phase::ScaffoldTestApp,
            Phase::MoveAuxiliaryFiles,
            Phase::MoveTestTree,
            Phase::RewriteRelocatedReferences,
            Phase::ReconcileDestinationManifest,
            Phase::RemoveSourceLeftovers,
            Phase::RelocateLibrary,
            Phase::DrainStaging,
        ]
    );
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(versions.calls.get(), 1);

    let test_app = root.join("test-app");
    let package = root.join("package");

    // test tree moved, dummy app dropped
    assert!(test_app.join("tests/unit/foo-test.js").is_file());
    assert!(test_app.join("tests/integration/components/foo-test.js").is_file());
    assert!(!test_app.join("tests/dummy").exists());
    assert!(!test_app.join("tests/index.html").exists());

    // auxiliary files moved and rewritten
    assert!(test_app.join("config/ember-try.js").is_file());
    assert!(test_app.join(".eslintrc.js").is_file());
    let build = read(&test_app.join("ember-cli-build.js"));
    assert!(build.contains("new EmberApp(defaults"));
    assert!(build.contains("ember-cli/lib/broccoli/ember-app'"));
    assert!(!build.contains("EmberAddon"));
    let helper = read(&test_app.join("tests/test-helper.js"));
    assert_eq!(
        helper,
        "import Application from 'test-app/app';\nimport config from 'test-app/config/environment';\n"
    );

    // destination manifest reconciled
    let manifest = read_json(&test_app.join("package.json"));
    assert_eq!(manifest["dependencies"]["my-addon"], "*");
    assert_eq!(manifest["devDependencies"]["@embroider/test-setup"], TEST_SETUP_VERSION);
    assert_eq!(manifest["devDependencies"]["ember-source"], "~5.4.0");
    assert_eq!(manifest["devDependencies"]["ember-try"], "^2.0.0");
    assert!(manifest["devDependencies"].get("ember-welcome-page").is_none());
    assert_eq!(manifest["scripts"]["test"], "ember test");
    assert!(!test_app.join("app/templates/application.hbs").exists());
    assert!(test_app.join("app/app.js").is_file());

    // library relocated, leftovers gone
    assert!(package.join("package.json").is_file());
    // every top-level script goes, the entry point included
    assert!(!package.join("index.js").exists());
    assert!(!root.join("index.js").exists());
    assert!(package.join("addon/components/foo.js").is_file());
    assert!(package.join("README.md").is_file());
    assert!(package.join(".gitignore").is_file());
    for leftover in ["app", "tests", "vendor", "config", "testem.js", ".watchmanconfig", ".ember-cli"] {
        assert!(!package.join(leftover).exists(), "{leftover} should be removed");
        assert!(!root.join(leftover).exists(), "{leftover} should be removed");
    }

    // root keeps lockfile and installed modules
    assert!(root.join("yarn.lock").is_file());
    assert!(root.join("node_modules/ember-source/index.js").is_file());

    let analysis = report.analysis.unwrap();
    assert!(!analysis.tmp_location.exists());
}

#[tokio::test]
async fn test_analysis_only_leaves_tree_untouched() {
    let dir = tempdir().unwrap();
    write_addon(dir.path(), Some("package-lock.json"));
    let before = snapshot_tree(dir.path());

    let blueprint = FakeBlueprint::default();
    let report = extract_tests(
        TransformOptions::new(dir.path()).with_analysis_only(true),
        FixedVersion::default(),
        &blueprint,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::Aborted));
    assert_eq!(report.committed, vec![Phase::Scan]);
    assert_eq!(snapshot_tree(dir.path()), before);
    assert!(blueprint.requests.borrow().is_empty());

    let analysis = report.analysis.unwrap();
    assert_eq!(analysis.name, "my-addon");
    assert!(!analysis.tmp_location.exists());
}

#[tokio::test]
async fn test_missing_manifest_faults_before_mutation() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("index.js"), "");

    let report = extract_tests(
        TransformOptions::new(dir.path()),
        FixedVersion::default(),
        FakeBlueprint::default(),
    )
    .await;

    assert_faulted_at(&report.outcome, Phase::Scan, codes::MANIFEST_NOT_FOUND);
    assert!(report.committed.is_empty());
    assert!(report.analysis.is_none());
    assert_eq!(snapshot_tree(dir.path()), vec!["index.js"]);
}

#[tokio::test]
async fn test_registry_fault_stops_before_leftover_removal() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_addon(root, Some("yarn.lock"));

    let report = extract_tests(TransformOptions::new(root), OfflineRegistry, FakeBlueprint::default()).await;

    assert_faulted_at(
        &report.outcome,
        Phase::ReconcileDestinationManifest,
        codes::REGISTRY_LOOKUP_FAILED,
    );
    assert_eq!(report.last_committed(), Some(Phase::RewriteRelocatedReferences));

    // earlier phases are not rolled back
    assert!(root.join("test-app/tests/unit/foo-test.js").is_file());
    // nothing in the faulted phase was written
    let manifest = read_json(&root.join("test-app/package.json"));
    assert!(manifest.get("dependencies").is_none());
    assert_eq!(manifest["devDependencies"]["ember-welcome-page"], "^7.0.2");
    assert!(root.join("test-app/app/templates/application.hbs").is_file());
    // later phases never ran
    assert!(root.join("app/components/foo.js").is_file());
    assert!(root.join("index.js").is_file());
    assert!(!root.join("package").exists());

    assert!(!report.analysis.unwrap().tmp_location.exists());
}

#[tokio::test]
async fn test_scaffold_fault_cleans_staging() {
    let dir = tempdir().unwrap();
    write_addon(dir.path(), Some("yarn.lock"));

    let report = extract_tests(TransformOptions::new(dir.path()), FixedVersion::default(), BrokenBlueprint).await;

    assert_faulted_at(&report.outcome, Phase::ScaffoldTestApp, codes::SCAFFOLD_FAILED);
    assert_eq!(report.committed, vec![Phase::Scan, Phase::StageSource]);
    assert!(!report.analysis.unwrap().tmp_location.exists());
    assert!(dir.path().join("tests/dummy/app/app.js").is_file());
}

#[tokio::test]
async fn test_invalid_options_fault_at_scan() {
    let dir = tempdir().unwrap();
    write_addon(dir.path(), Some("yarn.lock"));

    let report = extract_tests(
        TransformOptions::new(dir.path()).with_test_app_name(""),
        FixedVersion::default(),
        FakeBlueprint::default(),
    )
    .await;

    assert_faulted_at(&report.outcome, Phase::Scan, codes::OPTIONS_INVALID);
}

#[tokio::test]
async fn test_beside_library_in_workspace() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(&root.join("package.json"), r#"{"name":"root","private":true}"#);
    write(&root.join("pnpm-workspace.yaml"), "packages:\n  - 'packages/*'\n");
    write(&root.join("pnpm-lock.yaml"), "");
    let member = root.join("packages/my-addon");
    write_addon(&member, None);

    let options = TransformOptions::new(&member)
        .with_in_place(false)
        .with_test_app_name("my-addon-tests")
        .with_policy(Policy {
            reuse_existing_versions: true,
            ignore_new_dependencies: true,
        });
    let report = extract_tests(options, FixedVersion::default(), FakeBlueprint::default()).await;

    assert!(matches!(report.outcome, Outcome::Completed), "{:?}", report.outcome);
    assert!(!report.committed.contains(&Phase::RelocateLibrary));

    let test_app = root.join("packages/test-app");
    let manifest = read_json(&test_app.join("package.json"));
    assert_eq!(manifest["dependencies"]["my-addon"], "workspace:*");
    // reused from the addon
    assert_eq!(manifest["devDependencies"]["ember-source"], "~4.8.0");
    assert_eq!(manifest["devDependencies"]["ember-qunit"], "^6.0.0");
    // not declared by the addon
    assert!(manifest["devDependencies"].get("ember-fetch").is_none());

    // imports follow the location, not the package name
    let helper = read(&test_app.join("tests/test-helper.js"));
    assert_eq!(
        helper,
        "import Application from '../test-app/app';\nimport config from '../test-app/config/environment';\n"
    );

    // library stays where it was
    assert!(member.join("package.json").is_file());
    assert!(member.join("addon/components/foo.js").is_file());
    assert!(!member.join("tests").exists());
    assert!(!member.join("package").exists());
}
