use routefs::routing::{BoxError, Context, Module, Route};

pub fn module() -> Module {
    Module::new(Route::new(|_ctx: Context| async {
        Err::<(), BoxError>("this route always fails".into())
    }))
}
