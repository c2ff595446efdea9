//! Behavioural properties of the parse → diff → render pipeline.
//!
//! Each test drives the public `Engine` API with small hand-written
//! manifests and checks one property of the resulting report:
//! - idempotence and before/after symmetry
//! - secret redaction and its opt-out
//! - kind and field suppression
//! - test-hook exclusion
//! - namespace defaulting and duplicate documents

use manidiff_core::{
    Change, ContextWindow, DiffOptions, DiffReport, Engine, Renderer, SuppressRule,
};
use manidiff_schema::{parse_manifests, ParseOptions, ResourceKey};
use std::collections::BTreeSet;

const RELEASE: &str = r"# Source: web/templates/deployment.yaml
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
spec:
  replicas: 2
  template:
    spec:
      containers:
      - name: web
        image: nginx:1.25
---
# Source: web/templates/service.yaml
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  ports:
  - port: 80
---
# Source: web/templates/config.yaml
apiVersion: v1
kind: ConfigMap
metadata:
  name: web-config
data:
  mode: production
---
apiVersion: v1
kind: Secret
metadata:
  name: web-creds
stringData:
  password: supersecret
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: web-reader
rules: []
";

const UPGRADE: &str = r"# Source: web/templates/deployment.yaml
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
spec:
  replicas: 3
  template:
    spec:
      containers:
      - name: web
        image: nginx:1.26
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: web-config
data:
  mode: staging
---
apiVersion: v1
kind: Secret
metadata:
  name: web-creds
stringData:
  password: supersecret2
---
apiVersion: batch/v1
kind: Job
metadata:
  name: migrate
spec:
  template:
    spec:
      restartPolicy: Never
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: web-reader
rules: []
";

const TEST_HOOK_POD: &str = r#"apiVersion: v1
kind: Pod
metadata:
  name: web-test
  annotations:
    helm.sh/hook: test
spec:
  containers:
  - name: probe
    image: busybox
"#;

fn option_grid() -> Vec<DiffOptions> {
    let mut grid = Vec::new();
    for redact_secrets in [true, false] {
        for context in [ContextWindow::Lines(0), ContextWindow::Lines(3), ContextWindow::Unlimited] {
            grid.push(DiffOptions {
                redact_secrets,
                context,
                suppress: Vec::new(),
            });
        }
    }
    grid
}

fn render(engine: &Engine, before: &str, after: &str) -> (bool, String) {
    let mut out = Vec::new();
    let changed = engine
        .run(before, after, &Renderer::Diff { color: false }, &mut out)
        .unwrap();
    (changed, String::from_utf8(out).unwrap())
}

fn keys_with(report: &DiffReport, change: Change) -> BTreeSet<ResourceKey> {
    report
        .entries
        .iter()
        .filter(|e| e.change == change)
        .map(|e| e.key.clone())
        .collect()
}

#[test]
fn diffing_against_itself_reports_nothing() {
    for diff in option_grid() {
        let engine = Engine::new(ParseOptions::default(), diff);
        for input in [RELEASE, UPGRADE] {
            let report = engine.compare(input, input).unwrap();
            assert!(!report.any_change_observed);
            assert_eq!(report.changes().count(), 0);
        }
    }
}

#[test]
fn swapping_sides_mirrors_the_report() {
    for diff in option_grid() {
        let engine = Engine::new(ParseOptions::default(), diff);
        let forward = engine.compare(RELEASE, UPGRADE).unwrap();
        let backward = engine.compare(UPGRADE, RELEASE).unwrap();

        assert_eq!(forward.any_change_observed, backward.any_change_observed);
        assert_eq!(
            keys_with(&forward, Change::Added),
            keys_with(&backward, Change::Removed)
        );
        assert_eq!(
            keys_with(&forward, Change::Removed),
            keys_with(&backward, Change::Added)
        );
        assert_eq!(
            keys_with(&forward, Change::Modified),
            keys_with(&backward, Change::Modified)
        );
    }
}

#[test]
fn swapping_sides_pairs_the_same_defaulted_key() {
    let defaulted = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n";
    let explicit = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n  namespace: x\n---\n\
                    apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n  namespace: y\n";
    let engine = Engine::default();
    let forward = engine.compare(defaulted, explicit).unwrap();
    let backward = engine.compare(explicit, defaulted).unwrap();

    let namespaces = |report: &DiffReport, change: Change| -> Vec<String> {
        keys_with(report, change)
            .iter()
            .filter_map(|k| k.namespace.as_ref().map(|ns| ns.as_str().to_owned()))
            .collect()
    };
    assert_eq!(namespaces(&forward, Change::Modified), vec!["x"]);
    assert_eq!(namespaces(&backward, Change::Modified), vec!["x"]);
    assert_eq!(namespaces(&forward, Change::Added), vec!["y"]);
    assert_eq!(namespaces(&backward, Change::Removed), vec!["y"]);
    assert_eq!(
        keys_with(&forward, Change::Added),
        keys_with(&backward, Change::Removed)
    );

    for report in [&forward, &backward] {
        let paired = report
            .entries
            .iter()
            .find_map(|e| e.paired_key.as_ref())
            .unwrap();
        assert_eq!(paired.namespace.as_ref().unwrap().as_str(), "default");
    }
}

#[test]
fn release_upgrade_classification() {
    let report = Engine::default().compare(RELEASE, UPGRADE).unwrap();
    let summary = report.summary();
    assert_eq!(summary.added, 1, "Job");
    assert_eq!(summary.removed, 1, "Service");
    assert_eq!(summary.modified, 3, "Deployment, ConfigMap, Secret");
    assert_eq!(summary.unchanged, 1, "ClusterRole");
}

#[test]
fn redaction_hides_secret_values() {
    let (changed, text) = render(&Engine::default(), RELEASE, UPGRADE);
    assert!(changed);
    assert!(!text.contains("supersecret"));
    assert!(text.contains("-   password: '-------- # (11 bytes)'"));
    assert!(text.contains("+   password: '++++++++ # (12 bytes)'"));
}

#[test]
fn disabling_redaction_shows_changed_values() {
    let engine = Engine::new(
        ParseOptions::default(),
        DiffOptions {
            redact_secrets: false,
            ..DiffOptions::default()
        },
    );
    let (_, text) = render(&engine, RELEASE, UPGRADE);
    assert!(text.contains("+   password: supersecret2"));
}

#[test]
fn unchanged_secret_is_marked_redacted_in_context() {
    let secret = "apiVersion: v1\nkind: Secret\nmetadata:\n  name: s\n  labels:\n    v: \"1\"\ndata:\n  token: c3VwZXJzZWNyZXQ=\n";
    let engine = Engine::default();
    let (_, text) = render(&engine, secret, &secret.replace("v: \"1\"", "v: \"2\""));
    assert!(text.contains("    token: 'REDACTED # (11 bytes)'"));
    assert!(!text.contains("c3VwZXJzZWNyZXQ="));
}

#[test]
fn suppressed_kind_hides_its_differences() {
    let before = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\ndata:\n  mode: a\n";
    let after = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\ndata:\n  mode: b\n";
    let engine = Engine::new(
        ParseOptions::default(),
        DiffOptions {
            suppress: vec![SuppressRule::parse("ConfigMap").unwrap()],
            ..DiffOptions::default()
        },
    );
    let (changed, text) = render(&engine, before, after);
    assert!(!changed);
    assert!(text.is_empty());
}

#[test]
fn suppression_leaves_other_kinds_visible() {
    let engine = Engine::new(
        ParseOptions::default(),
        DiffOptions {
            suppress: vec![SuppressRule::parse("ConfigMap").unwrap()],
            ..DiffOptions::default()
        },
    );
    let (changed, text) = render(&engine, RELEASE, UPGRADE);
    assert!(changed);
    assert!(!text.contains("ConfigMap"));
    assert!(!text.contains("mode:"));
    assert!(text.contains("Deployment (apps/v1) has changed:"));
}

#[test]
fn suppressing_secret_runs_before_redaction() {
    let engine = Engine::new(
        ParseOptions::default(),
        DiffOptions {
            suppress: vec![SuppressRule::parse("Secret").unwrap()],
            ..DiffOptions::default()
        },
    );
    let report = engine.compare(RELEASE, UPGRADE).unwrap();
    let secret = report
        .entries
        .iter()
        .find(|e| e.key.kind.as_str() == "Secret")
        .unwrap();
    assert_eq!(secret.change, Change::Unchanged);
}

#[test]
fn test_hooks_are_excluded_unless_requested() {
    let before = RELEASE.to_owned();
    let after = format!("{RELEASE}---\n{TEST_HOOK_POD}");

    let (changed, _) = render(&Engine::default(), &before, &after);
    let default_report = Engine::default().compare(&before, &after).unwrap();
    assert!(!changed);
    assert!(default_report
        .entries
        .iter()
        .all(|e| e.key.name.as_str() != "web-test"));

    let engine = Engine::new(ParseOptions::default().including_hooks(), DiffOptions::default());
    let (changed, text) = render(&engine, &before, &after);
    assert!(changed);
    assert!(text.contains("default, web-test, Pod (v1) has been added:"));
    assert!(text.contains("+     helm.sh/hook: test"));
}

#[test]
fn added_namespace_on_defaulted_pod_is_a_one_line_change() {
    let before = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n";
    let after = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n  namespace: x\n";
    let engine = Engine::new(
        ParseOptions::default().with_default_namespace("default"),
        DiffOptions::default(),
    );

    let (old, new) = engine.parse_pair(before, after).unwrap();
    let old_key = old.keys().next().unwrap();
    let new_key = new.keys().next().unwrap();
    assert_eq!(old_key.namespace.as_ref().unwrap().as_str(), "default");
    assert_eq!(new_key.namespace.as_ref().unwrap().as_str(), "x");

    let report = engine.compare(before, after).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].change, Change::Modified);

    let (changed, text) = render(&engine, before, after);
    assert!(changed);
    let added: Vec<_> = text.lines().filter(|l| l.starts_with("+ ")).collect();
    assert_eq!(added, vec!["+   namespace: x"]);
    assert!(text.lines().all(|l| !l.starts_with("- ")));
}

#[test]
fn later_duplicate_document_wins() {
    let input = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\nspec:\n  restartPolicy: Always\n---\n\
                 apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\nspec:\n  restartPolicy: Never\n";
    let collection = parse_manifests(input, &ParseOptions::default()).unwrap();
    assert_eq!(collection.len(), 1);
    let pod = collection.iter().next().unwrap();
    let expected: serde_yaml::Value = serde_yaml::from_str(
        "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\nspec:\n  restartPolicy: Never\n",
    )
    .unwrap();
    assert_eq!(pod.body, expected);
}

#[test]
fn report_serializes_for_templates() {
    let report = Engine::default().compare(RELEASE, UPGRADE).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["any_change_observed"], serde_json::json!(true));
    let changes: Vec<_> = json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["change"].as_str().unwrap())
        .collect();
    assert!(changes.contains(&"added"));
    assert!(changes.contains(&"unchanged"));
}
