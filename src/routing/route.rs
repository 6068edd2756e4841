//! The route handler capability.
//!
//! A [`Route`] can only be made through [`Route::new`], so "is this a route
//! handler" is answered by the type system rather than probed at runtime.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::pattern::{Captured, RoutePattern};

/// Request type seen by handlers. The body is buffered once per request so
/// every handler tried during fallthrough sees the same bytes.
pub type RouteRequest = Request<Bytes>;

/// Error type handlers may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a handler learns about the match that selected it.
#[derive(Debug, Clone)]
pub struct Context {
    /// The incoming request.
    pub request: Arc<RouteRequest>,
    /// Substrings captured from the request path.
    pub captured: Captured,
    /// Module reference of the route file, relative to the discovery root,
    /// including suffix and extension (e.g. `api/hello.route.rs`).
    pub path: String,
    /// The pattern that matched.
    pub pattern: RoutePattern,
}

/// What a handler produced.
///
/// Only [`Outcome::Response`] and [`Outcome::Fallthrough`] honour the handler
/// contract. Plain strings are not responses: converting one yields
/// [`Outcome::Unexpected`], which the dispatcher answers with a 500.
#[derive(Debug)]
pub enum Outcome {
    /// A finished response; dispatch stops here.
    Response(Response),
    /// Decline the request; the next matching route is tried.
    Fallthrough,
    /// Anything else, kept as its debug rendering for the error log.
    Unexpected(String),
}

impl Outcome {
    /// Wrap a value that is neither a response nor a fallthrough.
    pub fn unexpected(value: impl fmt::Debug) -> Self {
        Outcome::Unexpected(format!("{value:?}"))
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Outcome::Response(response)
    }
}

/// A handler with nothing to return declines, same as [`Outcome::Fallthrough`].
impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Fallthrough
    }
}

impl From<Option<Response>> for Outcome {
    fn from(response: Option<Response>) -> Self {
        response.map_or(Outcome::Fallthrough, Outcome::Response)
    }
}

impl From<String> for Outcome {
    fn from(value: String) -> Self {
        Outcome::unexpected(value)
    }
}

impl From<&'static str> for Outcome {
    fn from(value: &'static str) -> Self {
        Outcome::unexpected(value)
    }
}

type HandlerFn = dyn Fn(Context) -> BoxFuture<'static, Result<Outcome, BoxError>> + Send + Sync;

/// A route handler.
#[derive(Clone)]
pub struct Route {
    handler: Arc<HandlerFn>,
}

impl Route {
    /// Wrap an async function as a route handler.
    ///
    /// ```
    /// use axum::response::IntoResponse;
    /// use routefs::routing::{Context, Route};
    ///
    /// let route = Route::new(|ctx: Context| async move {
    ///     let name = ctx.captured.get("name").cloned().flatten();
    ///     Ok::<_, std::convert::Infallible>(format!("hi {name:?}").into_response())
    /// });
    /// # let _ = route;
    /// ```
    pub fn new<F, Fut, O, E>(handler: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
        O: Into<Outcome>,
        E: Into<BoxError>,
    {
        Self {
            handler: Arc::new(move |ctx| {
                handler(ctx)
                    .map(|result| result.map(Into::into).map_err(Into::into))
                    .boxed()
            }),
        }
    }

    /// Invoke the handler.
    pub fn call(&self, ctx: Context) -> BoxFuture<'static, Result<Outcome, BoxError>> {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").finish_non_exhaustive()
    }
}
