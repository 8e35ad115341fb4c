//! Tally CLI library.
//!
//! This crate provides the CLI interface over the tally engine and its
//! `SQLite` store.

mod cli;
pub mod commands;
mod config;

pub use cli::{
    Cli, Commands, CreateArgs, DeleteArgs, EntryArgs, OutputArgs, PageArgs, ProjectsAction,
    RangeArgs, RunningArgs, ShowArgs, StartArgs, StopArgs, SyncTarget, TagArgs, TasksAction,
    UpdateArgs,
};
pub use config::Config;
