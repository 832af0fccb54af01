//! Resource sync middleware
//!
//! Tower layer that refreshes the deployed copy of a requested resource
//! before the rest of the stack serves it.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use hotdeploy_core::{FilterConfig, RequestContext, ResourceSync};
use tower::{Layer, Service};
use tracing::{debug, error};

/// Resource path of an internal include or forward.
///
/// Handlers that dispatch a sub-request for another resource insert this
/// extension; the sync then targets the included resource rather than the
/// URI of the outer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeTarget(pub String);

impl IncludeTarget {
    /// Marks `request` as an include of `path`.
    pub fn attach<B>(request: &mut Request<B>, path: impl Into<String>) {
        request.extensions_mut().insert(IncludeTarget(path.into()));
    }
}

/// Layer that wraps services in [`ResourceSyncService`].
#[derive(Debug, Clone)]
pub struct ResourceSyncLayer {
    sync: ResourceSync,
}

impl ResourceSyncLayer {
    /// Creates the layer from a filter configuration.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            sync: ResourceSync::new(config),
        }
    }
}

impl<S> Layer<S> for ResourceSyncLayer {
    type Service = ResourceSyncService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResourceSyncService {
            inner,
            sync: self.sync.clone(),
        }
    }
}

/// Middleware that syncs a resource, then hands the request on.
///
/// The inner service is called exactly once per request unless the sync
/// fails, in which case the request ends with `500 Internal Server Error`.
#[derive(Debug, Clone)]
pub struct ResourceSyncService<S> {
    inner: S,
    sync: ResourceSync,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ResourceSyncService<S>
where
    S: Service<Request<ReqBody>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Keep the instance that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if !self.sync.is_enabled() {
            return Box::pin(inner.call(request));
        }

        let sync = self.sync.clone();
        Box::pin(async move {
            let include_target = request
                .extensions()
                .get::<IncludeTarget>()
                .map(|target| target.0.as_str());
            let context = RequestContext::resolve(include_target, request.uri().path());

            match sync.sync(&context).await {
                Ok(outcome) => {
                    debug!("{}: {}", context.requested_path, outcome);
                    inner.call(request).await
                }
                Err(e) => {
                    error!("Failed to sync {}: {}", context.requested_path, e);
                    Ok(sync_failure_response())
                }
            }
        })
    }
}

fn sync_failure_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Body::from("Failed to update deployed resource"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use tower::ServiceExt;

    use super::*;

    async fn ok_handler(_request: Request<Body>) -> Result<Response, Infallible> {
        Ok(StatusCode::OK.into_response())
    }

    #[test]
    fn test_include_target_attach() {
        let mut request = Request::builder().uri("/index.jsp").body(()).unwrap();
        IncludeTarget::attach(&mut request, "/header.html");

        assert_eq!(
            request.extensions().get::<IncludeTarget>(),
            Some(&IncludeTarget("/header.html".to_string()))
        );
    }

    #[tokio::test]
    async fn test_disabled_layer_passes_through() {
        let service = ResourceSyncLayer::new(FilterConfig::new("/nonexistent/deploy"))
            .layer(tower::service_fn(ok_handler));

        let response = service
            .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
