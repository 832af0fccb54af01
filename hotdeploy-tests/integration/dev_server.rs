//! End-to-end: the development router serving the deployment directory.

use std::time::Duration;

use axum::body::to_bytes;
use axum::http::StatusCode;
use hotdeploy_core::test_fixtures::WebappDirs;
use hotdeploy_web::router;
use tower::ServiceExt;

use crate::common::get;

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_first_request_serves_synced_page() {
    let dirs = WebappDirs::new();
    dirs.write_source("/index.html", "Version: ${pom.version}");
    let app = router(dirs.config().with_variables([("pom.version", "1.0.0-SNAPSHOT")]));

    let response = app.oneshot(get("/index.html")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Version: 1.0.0-SNAPSHOT");
}

#[tokio::test]
async fn test_edit_shows_up_on_next_request() {
    let dirs = WebappDirs::new();
    dirs.write_source("/site.css", "body { color: red; }");
    let app = router(dirs.config());

    let first = app.clone().oneshot(get("/site.css")).await.unwrap();
    assert_eq!(body_text(first).await, "body { color: red; }");

    dirs.write_source("/site.css", "body { color: blue; }");
    dirs.make_source_newer("/site.css", Duration::from_secs(5));

    let second = app.oneshot(get("/site.css")).await.unwrap();
    assert_eq!(body_text(second).await, "body { color: blue; }");
}

#[tokio::test]
async fn test_disabled_serves_deployment_as_is() {
    let dirs = WebappDirs::new();
    dirs.write_source("/index.html", "source");
    dirs.write_deployed("/index.html", "deployed");
    dirs.make_source_newer("/index.html", Duration::from_secs(60));
    let app = router(dirs.config().with_enabled(false));

    let response = app.oneshot(get("/index.html")).await.unwrap();

    assert_eq!(body_text(response).await, "deployed");
}

#[tokio::test]
async fn test_missing_everywhere_is_not_found() {
    let dirs = WebappDirs::new();
    let app = router(dirs.config());

    let response = app.oneshot(get("/nope.html")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
