//! nvs: a dotfiles bootstrapper.
//!
//! Locates or clones a dotfiles repository, picks out the entries that look
//! like configuration files, and links them into the home directory,
//! backing up whatever was there first.
//!
//! The crate is organised in layers:
//!
//! - **[`classify`]**: which repository entries are dotfiles, and where they go
//! - **[`scan`]**: compare each target with the link it should be
//! - **[`link`]**: the per-entry backup and link transaction
//! - **[`resources`]**: idempotent symlink primitives over [`operations`]
//! - **[`source`]** and **[`state`]**: GitHub clones and `~/.nvs/config.json`
//! - **[`flow`]**, **[`prompt`]**, **[`commands`]**: the interactive front end
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod classify;
pub mod cli;
pub mod commands;
pub mod error;
pub mod exec;
pub mod flow;
pub mod link;
pub mod logging;
pub mod operations;
pub mod prompt;
pub mod resources;
pub mod scan;
pub mod source;
pub mod state;
