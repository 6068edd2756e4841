use axum::response::{Html, IntoResponse};
use routefs::routing::{BoxError, Context, Module, Route};

pub fn module() -> Module {
    Module::new(Route::new(|_ctx: Context| async {
        Ok::<_, BoxError>(Html("<h1>routefs</h1><p>Try <a href=\"/hello\">/hello</a>.</p>").into_response())
    }))
}
