use routefs::routing::{BoxError, Context, Module, Route};

// A string is not a response; requests here answer 500.
pub fn module() -> Module {
    Module::new(Route::new(|_ctx: Context| async { Ok::<_, BoxError>("not a response") }))
}
