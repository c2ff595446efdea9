use criterion::{criterion_group, criterion_main, Criterion};
use manidiff_core::{ContextWindow, DiffOptions, Engine, Renderer};
use manidiff_schema::ParseOptions;

fn release(resources: usize, image: &str) -> String {
    let mut out = String::new();
    for i in 0..resources {
        out.push_str(&format!(
            r"---
# Source: app/templates/deployment-{i}.yaml
apiVersion: apps/v1
kind: Deployment
metadata:
  name: app-{i}
  labels:
    app: app-{i}
spec:
  replicas: 2
  template:
    spec:
      containers:
      - name: app
        image: {image}
        env:
        - name: INDEX
          value: '{i}'
---
apiVersion: v1
kind: Secret
metadata:
  name: app-{i}-creds
data:
  token: c3VwZXJzZWNyZXQ=
"
        ));
    }
    out
}

fn bench_compare_unchanged(c: &mut Criterion) {
    let input = release(200, "nginx:1.25");
    let engine = Engine::default();
    c.bench_function("compare_unchanged_400docs", |b| {
        b.iter(|| engine.compare(&input, &input).unwrap());
    });
}

fn bench_compare_changed(c: &mut Criterion) {
    let before = release(200, "nginx:1.25");
    let after = release(200, "nginx:1.26");
    let engine = Engine::new(
        ParseOptions::default(),
        DiffOptions {
            context: ContextWindow::Lines(3),
            ..DiffOptions::default()
        },
    );
    c.bench_function("compare_changed_400docs", |b| {
        b.iter(|| engine.compare(&before, &after).unwrap());
    });
}

fn bench_render_diff(c: &mut Criterion) {
    let before = release(200, "nginx:1.25");
    let after = release(200, "nginx:1.26");
    let engine = Engine::default();
    let renderer = Renderer::Diff { color: false };
    c.bench_function("run_render_diff_400docs", |b| {
        b.iter_with_setup(Vec::<u8>::new, |mut out| {
            engine.run(&before, &after, &renderer, &mut out).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_compare_unchanged,
    bench_compare_changed,
    bench_render_diff
);
criterion_main!(benches);
