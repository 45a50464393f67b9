#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for `~/.nvs/config.json`.

mod common;

use std::path::PathBuf;

use common::SandboxBuilder;
use nvs_cli::state::{LinkKind, LinkRecord, StateStore};

/// A state file written by an earlier release loads unchanged.
#[test]
fn reads_existing_state_file() {
    let sandbox = SandboxBuilder::new()
        .home_file(
            ".nvs/config.json",
            r#"{
  "dotfilesDir": "/home/u/dotfiles",
  "repos": [
    {
      "owner": "alice",
      "name": "dots",
      "url": "https://github.com/alice/dots",
      "localPath": "/home/u/.nvs/repos/alice/dots"
    }
  ],
  "links": [
    { "source": "/home/u/dotfiles/vimrc", "target": "/home/u/.vimrc", "type": "symlink" },
    { "source": "/home/u/dotfiles/zshrc", "target": "/home/u/.zshrc", "type": "copy" }
  ]
}"#,
        )
        .build();

    let state = StateStore::new(&sandbox.home()).load().unwrap();
    assert_eq!(state.dotfiles_dir, PathBuf::from("/home/u/dotfiles"));
    assert_eq!(state.repos[0].local_path, PathBuf::from("/home/u/.nvs/repos/alice/dots"));
    assert_eq!(state.links[0].kind, LinkKind::Symlink);
    assert_eq!(state.links[1].kind, LinkKind::Copy);
}

/// Appending keeps earlier records and writes the same shape back.
#[test]
fn append_round_trips_through_disk() {
    let sandbox = SandboxBuilder::new().build();
    let store = StateStore::new(&sandbox.home());

    store
        .add_link(&LinkRecord::symlink(
            sandbox.repo().join("vimrc"),
            sandbox.home_path(".vimrc"),
        ))
        .unwrap();
    store.set_dotfiles_dir(&sandbox.repo()).unwrap();

    let reopened = StateStore::new(&sandbox.home()).load().unwrap();
    assert_eq!(reopened.dotfiles_dir, sandbox.repo());
    assert_eq!(reopened.links.len(), 1);

    let raw = sandbox.read_home(".nvs/config.json");
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["links"][0]["type"], "symlink");
    assert!(json["repos"].as_array().unwrap().is_empty());
}
