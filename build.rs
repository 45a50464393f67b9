//! Sets `NVS_VERSION` for `--version` and the log file header.
//!
//! A release build passes `NVS_VERSION` in; otherwise the crate version is
//! tagged with the short commit hash, plus `.dirty` for uncommitted changes.
#![allow(clippy::print_stdout)]
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    let version = std::env::var("NVS_VERSION").unwrap_or_else(|_| {
        let base = env!("CARGO_PKG_VERSION");
        match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) if !hash.is_empty() => {
                let dirty = git(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty());
                format!("{base}+{hash}{}", if dirty { ".dirty" } else { "" })
            }
            _ => base.to_string(),
        }
    });
    println!("cargo:rustc-env=NVS_VERSION={version}");

    for watched in [".git/HEAD", ".git/index"] {
        println!("cargo:rerun-if-changed={watched}");
    }
    println!("cargo:rerun-if-env-changed=NVS_VERSION");
}
