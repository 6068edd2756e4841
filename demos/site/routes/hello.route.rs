use axum::response::IntoResponse;
use routefs::routing::{BoxError, Context, Module, Route};

pub fn module() -> Module {
    Module::new(Route::new(|_ctx: Context| async {
        Ok::<_, BoxError>("Hello, world!".into_response())
    }))
}
