use axum::response::Response;
use routefs::routing::{BoxError, Context, Module, Route};

// No response falls through to the next matching route.
pub fn module() -> Module {
    Module::new(Route::new(|_ctx: Context| async { Ok::<Option<Response>, BoxError>(None) }))
        .with_precedence(9.0)
}
