use crate::exception::{ExceptionFilter, GlobalExceptionFilter, RaisedError, RequestDescriptor};
use axum::{BoxError, body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer routing every uncaught error through an [`ExceptionFilter`]
///
/// Two kinds of failure are caught:
/// - responses produced from a [`RaisedError`] (handlers returning
///   `Result<_, RaisedError>`);
/// - errors returned by the inner service itself.
///
/// # Example
/// ```rust,ignore
/// let app = Router::new()
///     .route("/users/{id}", get(find_user))
///     .layer(ExceptionLayer::new(GlobalExceptionFilter::default()));
/// ```
#[derive(Clone)]
pub struct ExceptionLayer {
    filter: Arc<dyn ExceptionFilter>,
}

impl ExceptionLayer {
    pub fn new<F: ExceptionFilter>(filter: F) -> Self {
        Self {
            filter: Arc::new(filter),
        }
    }

    pub fn from_shared(filter: Arc<dyn ExceptionFilter>) -> Self {
        Self { filter }
    }
}

impl Default for ExceptionLayer {
    fn default() -> Self {
        Self::new(GlobalExceptionFilter::default())
    }
}

impl<S> Layer<S> for ExceptionLayer {
    type Service = ExceptionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionMiddleware {
            inner,
            filter: self.filter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ExceptionMiddleware<S> {
    inner: S,
    filter: Arc<dyn ExceptionFilter>,
}

impl<S> Service<Request<Body>> for ExceptionMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let filter = self.filter.clone();
        let descriptor = RequestDescriptor::from_request(&request);

        // The clone may not be ready; keep the instance poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match inner.call(request).await {
                Ok(mut response) => match response.extensions_mut().remove::<RaisedError>() {
                    Some(raised) => Ok(filter.catch(&descriptor, &raised)),
                    None => Ok(response),
                },
                Err(err) => {
                    let raised = RaisedError::from_boxed(err.into());
                    Ok(filter.catch(&descriptor, &raised))
                }
            }
        })
    }
}
