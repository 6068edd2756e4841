//! Manifest round trips against live discovery.

mod common;

use std::sync::Arc;

use common::*;
use routefs::observability::RecordingDiagnostics;
use routefs::routing::{
    build, BuildError, Dispatcher, DiscoveryOptions, Manifest, ManifestError, Registry, Source,
};

const MANIFEST: &str = "routes.gen.toml";

fn site() -> (tempfile::TempDir, Registry) {
    let dir = route_tree(&[
        "*.route.rs",
        ":dynamic.route.rs",
        "hello.route.rs",
        "undefined.route.rs",
        "throw.route.rs",
        "api/hello.route.rs",
    ]);
    let registry = Registry::new()
        .with("*.route.rs", responding("wildcard").with_precedence(-1.0))
        .with(":dynamic.route.rs", echoing_captures().with_precedence(1.0))
        .with("hello.route.rs", responding("hello"))
        .with("undefined.route.rs", declining().with_precedence(9.0))
        .with("throw.route.rs", failing("thrown").with_precedence(2.0))
        .with("api/hello.route.rs", responding("api"));
    (dir, registry)
}

async fn from_source(source: &Source, registry: &Registry) -> Result<Dispatcher, BuildError> {
    build(source, registry, Arc::new(RecordingDiagnostics::new())).await
}

#[tokio::test]
async fn test_discovery_writes_manifest_in_table_order() {
    let (dir, registry) = site();
    let live = from_source(
        &Source::Discover {
            options: DiscoveryOptions::new(root_of(&dir)),
            manifest: Some(MANIFEST.into()),
        },
        &registry,
    )
    .await
    .unwrap();

    let manifest = Manifest::read(&dir.path().join(MANIFEST)).await.unwrap();
    let stored: Vec<_> = manifest.routes.iter().map(|r| r.pattern.as_str()).collect();
    assert_eq!(stored, live.table().patterns());
    assert_eq!(manifest.routes[0].module, "undefined.route.rs");
    assert_eq!(manifest.routes.last().unwrap().module, "*.route.rs");
}

#[tokio::test]
async fn test_manifest_serves_like_live_discovery() {
    let (dir, registry) = site();
    let live = from_source(
        &Source::Discover {
            options: DiscoveryOptions::new(root_of(&dir)),
            manifest: Some(MANIFEST.into()),
        },
        &registry,
    )
    .await
    .unwrap();
    let stored = from_source(&Source::Manifest(dir.path().join(MANIFEST)), &registry)
        .await
        .unwrap();

    assert_eq!(live.table().patterns(), stored.table().patterns());

    for path in ["/hello", "/undefined", "/throw", "/api/hello", "/api/other", "/x/y", "/"] {
        let a = live.dispatch(request(path)).await;
        let b = stored.dispatch(request(path)).await;
        assert_eq!(a.resolution, b.resolution, "resolution differs for {path}");
        assert_eq!(a.response.status(), b.response.status(), "status differs for {path}");
        assert_eq!(body_text(a.response).await, body_text(b.response).await, "body differs for {path}");
    }
}

#[tokio::test]
async fn test_manifest_order_is_not_resorted() {
    let (dir, registry) = site();
    let manifest = Manifest::from_toml(
        r#"
        [[route]]
        pattern = "/*"
        module = "*.route.rs"

        [[route]]
        pattern = "/hello"
        module = "hello.route.rs"
        "#,
    )
    .unwrap();
    let path = dir.path().join("custom.toml");
    manifest.write(&path).await.unwrap();

    let dispatcher = from_source(&Source::Manifest(path), &registry).await.unwrap();
    assert_eq!(dispatcher.table().patterns(), vec!["/*", "/hello"]);

    // The wildcard was stored first, so it wins even though its precedence is lower.
    let response = dispatcher.handle(request("/hello")).await;
    assert_eq!(body_text(response).await, "wildcard");
}

#[tokio::test]
async fn test_manifest_skips_discovery() {
    let (dir, registry) = site();
    from_source(
        &Source::Discover {
            options: DiscoveryOptions::new(root_of(&dir)),
            manifest: Some(MANIFEST.into()),
        },
        &registry,
    )
    .await
    .unwrap();

    // New files under the root are invisible until the manifest is regenerated.
    touch(dir.path(), "late.route.rs");
    let registry = registry.with("late.route.rs", responding("late"));

    let stored = from_source(&Source::Manifest(dir.path().join(MANIFEST)), &registry)
        .await
        .unwrap();
    assert!(!stored.table().patterns().contains(&"/late"));
}

#[tokio::test]
async fn test_manifest_with_unknown_module_fails() {
    let (dir, _) = site();
    let manifest = Manifest::from_toml("[[route]]\npattern = \"/gone\"\nmodule = \"gone.route.rs\"\n").unwrap();
    let path = dir.path().join("stale.toml");
    manifest.write(&path).await.unwrap();

    let err = from_source(&Source::Manifest(path), &Registry::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::Manifest(ManifestError::MissingRoute(ref module)) if module == "gone.route.rs"
    ));
}

#[tokio::test]
async fn test_missing_manifest_file_fails() {
    let (dir, registry) = site();
    let err = from_source(&Source::Manifest(dir.path().join("nope.toml")), &registry)
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::Manifest(ManifestError::Io { .. })));
}

#[tokio::test]
async fn test_written_manifest_is_commented_toml() {
    let (dir, registry) = site();
    from_source(
        &Source::Discover {
            options: DiscoveryOptions::new(root_of(&dir)),
            manifest: Some(MANIFEST.into()),
        },
        &registry,
    )
    .await
    .unwrap();

    let text = std::fs::read_to_string(dir.path().join(MANIFEST)).unwrap();
    assert!(text.starts_with('#'));
    assert!(text.contains("[[route]]"));
    assert!(text.contains("module = \"api/hello.route.rs\""));
}
