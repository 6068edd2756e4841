use axum::response::IntoResponse;
use axum::Json;
use routefs::routing::{BoxError, Context, Module, Route};
use serde_json::json;

pub fn module() -> Module {
    Module::new(Route::new(|ctx: Context| async move {
        let method = ctx.request.method().to_string();
        Ok::<_, BoxError>(Json(json!({ "hello": "world", "method": method })).into_response())
    }))
}
