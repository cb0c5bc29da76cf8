// build.rs

use std::env;

/// Stamps the binary with its release version. `THINGSTORE_VERSION` set at
/// build time wins over the crate version.
fn main() {
    println!("cargo:rerun-if-env-changed=THINGSTORE_VERSION");

    let version = match env::var("THINGSTORE_VERSION") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "dev".to_string()),
    };
    println!("cargo:rustc-env=THINGSTORE_BUILD_VERSION={version}");
}
