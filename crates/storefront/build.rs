//! Build script for the storefront crate.
//!
//! Fingerprints the stylesheet so templates can link an immutable,
//! content-addressed copy of it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Hex digits of the SHA-256 kept in the derived file name.
const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo"));
    fingerprint_css(&manifest_dir);
}

/// Copy `static/css/main.css` to `static/css/derived/main.<hash>.css`.
///
/// Exposes the hash as `CSS_HASH` for `env!("CSS_HASH")`.
fn fingerprint_css(manifest_dir: &Path) {
    let css_path = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = match fs::read(&css_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
            return;
        }
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short_hash = &digest[..HASH_LEN];
    println!("cargo:rustc-env=CSS_HASH={short_hash}");

    let derived_dir = manifest_dir.join("static/css/derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived CSS directory");

    // Drop fingerprints left by earlier builds.
    if let Ok(entries) = fs::read_dir(&derived_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("main.") && name.ends_with(".css") && !name.contains(short_hash) {
                let _ = fs::remove_file(entry.path());
            }
        }
    }

    fs::write(derived_dir.join(format!("main.{short_hash}.css")), &content)
        .expect("Failed to write derived CSS");
}
