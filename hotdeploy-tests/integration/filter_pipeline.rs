//! Resource sync layer in front of a counting downstream service.

use std::time::Duration;

use axum::http::StatusCode;
use hotdeploy_core::FilterConfig;
use hotdeploy_core::config::{ENABLED_PARAM, FILTER_VARIABLES_PARAM, InitParams};
use hotdeploy_core::test_fixtures::WebappDirs;
use hotdeploy_web::{IncludeTarget, ResourceSyncLayer};
use tower::{Layer, ServiceExt};

use crate::common::{Downstream, get};

fn init_params(enabled: &str, variables: &str) -> InitParams {
    InitParams::from([
        (ENABLED_PARAM.to_string(), enabled.to_string()),
        (FILTER_VARIABLES_PARAM.to_string(), variables.to_string()),
    ])
}

fn configured(dirs: &WebappDirs, enabled: &str, variables: &str) -> FilterConfig {
    FilterConfig::from_init_params(&init_params(enabled, variables), &dirs.deploy)
        .with_source_root(&dirs.source)
}

#[tokio::test]
async fn test_pom_version_scenario() {
    let dirs = WebappDirs::new();
    dirs.write_source("/index.html", "Version: ${pom.version}");
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "pom.version=1.0.0-SNAPSHOT"))
        .layer(downstream.clone());

    let response = service.oneshot(get("/index.html")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(downstream.calls(), 1);
    assert_eq!(
        dirs.read_deployed("/index.html").as_deref(),
        Some("Version: 1.0.0-SNAPSHOT")
    );
}

#[tokio::test]
async fn test_disabled_never_touches_filesystem() {
    let dirs = WebappDirs::new();
    dirs.write_source("/index.html", "Version: ${pom.version}");
    dirs.write_source("/site.css", "body {}");
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "false", "pom.version=1"))
        .layer(downstream.clone());

    for path in ["/index.html", "/site.css", "/missing.js", "/api/data"] {
        service.clone().oneshot(get(path)).await.unwrap();
    }

    assert_eq!(downstream.calls(), 4);
    assert_eq!(dirs.read_deployed("/index.html"), None);
    assert_eq!(dirs.read_deployed("/site.css"), None);
}

#[tokio::test]
async fn test_unwatched_extension_passes_through_uncopied() {
    let dirs = WebappDirs::new();
    dirs.write_source("/config.json", "{\"v\": 2}");
    dirs.write_deployed("/config.json", "{\"v\": 1}");
    dirs.make_source_newer("/config.json", Duration::from_secs(60));
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "")).layer(downstream.clone());

    service.oneshot(get("/config.json")).await.unwrap();

    assert_eq!(downstream.calls(), 1);
    assert_eq!(dirs.read_deployed("/config.json").as_deref(), Some("{\"v\": 1}"));
}

#[tokio::test]
async fn test_uppercase_extension_not_watched() {
    let dirs = WebappDirs::new();
    dirs.write_source("/LOGO.PNG", "png bytes");
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "")).layer(downstream.clone());

    service.oneshot(get("/LOGO.PNG")).await.unwrap();

    assert_eq!(downstream.calls(), 1);
    assert_eq!(dirs.read_deployed("/LOGO.PNG"), None);
}

#[tokio::test]
async fn test_stale_copy_replaced_and_fresh_copy_kept() {
    let dirs = WebappDirs::new();
    dirs.write_source("/app.js", "console.log('v2');");
    dirs.write_deployed("/app.js", "console.log('v1');");
    dirs.make_source_newer("/app.js", Duration::from_secs(30));
    dirs.write_source("/theme.css", "source theme");
    dirs.write_deployed("/theme.css", "deployed theme");
    dirs.make_deployed_newer("/theme.css", Duration::from_secs(30));
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "")).layer(downstream.clone());

    service.clone().oneshot(get("/app.js")).await.unwrap();
    service.oneshot(get("/theme.css")).await.unwrap();

    assert_eq!(downstream.calls(), 2);
    assert_eq!(dirs.read_deployed("/app.js").as_deref(), Some("console.log('v2');"));
    assert_eq!(dirs.read_deployed("/theme.css").as_deref(), Some("deployed theme"));
}

#[tokio::test]
async fn test_repeat_requests_do_not_substitute_twice() {
    let dirs = WebappDirs::new();
    dirs.write_source("/about.html", "<p>${project.name} ${unknownKey}</p>");
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "project.name=${project.name}!"))
        .layer(downstream.clone());

    service.clone().oneshot(get("/about.html")).await.unwrap();
    let after_first = dirs.read_deployed("/about.html");
    service.oneshot(get("/about.html")).await.unwrap();

    assert_eq!(downstream.calls(), 2);
    assert_eq!(after_first.as_deref(), Some("<p>${project.name}! ${unknownKey}</p>"));
    assert_eq!(dirs.read_deployed("/about.html"), after_first);
}

#[tokio::test]
async fn test_include_target_wins_over_request_path() {
    let dirs = WebappDirs::new();
    dirs.write_source("/fragments/header.html", "<h1>${project.name}</h1>");
    dirs.write_source("/index.html", "outer page");
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "project.name=MyProject"))
        .layer(downstream.clone());

    let mut request = get("/index.html");
    IncludeTarget::attach(&mut request, "/fragments/header.html");
    service.oneshot(request).await.unwrap();

    assert_eq!(downstream.calls(), 1);
    assert_eq!(
        dirs.read_deployed("/fragments/header.html").as_deref(),
        Some("<h1>MyProject</h1>")
    );
    assert_eq!(dirs.read_deployed("/index.html"), None);
}

#[tokio::test]
async fn test_query_string_ignored_and_path_decoded() {
    let dirs = WebappDirs::new();
    dirs.write_source("/release notes.txt", "notes");
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "")).layer(downstream.clone());

    service
        .oneshot(get("/release%20notes.txt?cache=bust"))
        .await
        .unwrap();

    assert_eq!(dirs.read_deployed("/release notes.txt").as_deref(), Some("notes"));
}

#[tokio::test]
async fn test_io_failure_becomes_server_error() {
    let dirs = WebappDirs::new();
    dirs.write_source("/nested/page.jsp", "<%= 1 %>");
    std::fs::remove_dir(dirs.deploy.join("nested")).unwrap();
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "")).layer(downstream.clone());

    let response = service.oneshot(get("/nested/page.jsp")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(downstream.calls(), 0);
}

#[tokio::test]
async fn test_malformed_variables_degrade_to_no_substitution() {
    let dirs = WebappDirs::new();
    dirs.write_source("/index.html", "${a} ${b}");
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(configured(&dirs, "true", "a=1=2,b=")).layer(downstream.clone());

    let response = service.oneshot(get("/index.html")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(dirs.read_deployed("/index.html").as_deref(), Some("${a} ${b}"));
}
