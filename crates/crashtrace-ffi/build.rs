//! Generates `crashtrace.h` into `OUT_DIR`.
//!
//! Set `CRASHTRACE_HEADER_DIR` to also copy the header somewhere a C build
//! can pick it up.

use std::env;
use std::path::PathBuf;

const HEADER: &str = "crashtrace.h";

fn main() {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR unset"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR unset"));

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
        .expect("failed to read cbindgen.toml");
    let bindings = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
        .expect("cbindgen failed to generate bindings");

    bindings.write_to_file(out_dir.join(HEADER));

    if let Some(dir) = env::var_os("CRASHTRACE_HEADER_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir).expect("failed to create header directory");
        bindings.write_to_file(dir.join(HEADER));
    }

    println!("cargo:rerun-if-changed=cbindgen.toml");
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-env-changed=CRASHTRACE_HEADER_DIR");
}
