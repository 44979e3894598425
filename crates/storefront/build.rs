//! Build script for the storefront crate.
//!
//! Hashes `static/css/main.css` so the stylesheet can be served under an
//! immutable, content-addressed name.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());
    println!("cargo:rerun-if-changed=migrations");

    let Ok(content) = fs::read(&css_path) else {
        println!("cargo:warning=main.css not found, serving unhashed stylesheet");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short_hash = digest.get(..8).unwrap_or(&digest).to_string();

    let derived_dir = Path::new(&manifest_dir).join("static/css/derived");
    let copied = fs::create_dir_all(&derived_dir)
        .and_then(|()| fs::copy(&css_path, derived_dir.join(format!("main.{short_hash}.css"))));
    match copied {
        Ok(_) => println!("cargo:rustc-env=CSS_HASH={short_hash}"),
        Err(e) => {
            println!("cargo:warning=Could not write hashed stylesheet: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}
