//! Demo site.
//!
//! ```text
//! cargo run --example site                    # serve demos/site/routes
//! cargo run --example site -- --no-serve      # only write routes.gen.toml
//! cargo run --example site -- --manifest demos/site/routes/routes.gen.toml
//! ```
//!
//! Wildcard patterns are ordered after everything else of equal precedence.

use std::cmp::Ordering;
use std::sync::Arc;

use clap::Parser;
use routefs::cli::{self, Args};
use routefs::routing::{PatternComparator, Registry};

#[path = "routes/.route.rs"]
mod index;
#[path = "routes/api/hello.route.rs"]
mod api_hello;
#[path = "routes/:dynamic.route.rs"]
mod dynamic;
#[path = "routes/hello.route.rs"]
mod hello;
#[path = "routes/string.route.rs"]
mod string;
#[path = "routes/throw.route.rs"]
mod throw;
#[path = "routes/undefined.route.rs"]
mod undefined;
#[path = "routes/void.route.rs"]
mod void;
#[path = "routes/*.route.rs"]
mod wildcard;

fn registry() -> Registry {
    Registry::new()
        .with(".route.rs", index::module())
        .with("api/hello.route.rs", api_hello::module())
        .with(":dynamic.route.rs", dynamic::module())
        .with("hello.route.rs", hello::module())
        .with("string.route.rs", string::module())
        .with("throw.route.rs", throw::module())
        .with("undefined.route.rs", undefined::module())
        .with("void.route.rs", void::module())
        .with("*.route.rs", wildcard::module())
}

fn wildcards_last() -> PatternComparator {
    Arc::new(|a: &str, b: &str| match (a.contains("/*"), b.contains("/*")) {
        (true, false) => Some(Ordering::Greater),
        (false, true) => Some(Ordering::Less),
        _ => None,
    })
}

#[tokio::main]
async fn main() -> Result<(), cli::CliError> {
    let mut args = Args::parse();
    if args.root.is_none() && args.manifest.is_none() {
        args.root = Some(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/site/routes").to_string());
    }
    cli::run_with(args, Arc::new(registry()), Some(wildcards_last())).await
}
