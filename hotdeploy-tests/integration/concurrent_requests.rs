//! Many simultaneous requests for the same stale page.

use hotdeploy_core::test_fixtures::WebappDirs;
use hotdeploy_web::ResourceSyncLayer;
use tower::{Layer, ServiceExt};

use crate::common::{Downstream, get};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_produce_one_consistent_page() {
    let dirs = WebappDirs::new();
    let body = "<p>${project.name}</p>\n".repeat(2_000);
    dirs.write_source("/index.html", &body);
    let downstream = Downstream::new();
    let service = ResourceSyncLayer::new(dirs.config().with_variables([("project.name", "MyProject")]))
        .layer(downstream.clone());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.oneshot(get("/index.html")).await.unwrap().status()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }

    assert_eq!(downstream.calls(), 16);
    assert_eq!(
        dirs.read_deployed("/index.html").unwrap(),
        "<p>MyProject</p>\n".repeat(2_000)
    );
}
