//! CLI subcommand implementations.

pub mod entries;
pub mod format;
pub mod queries;
pub mod records;
pub mod sync;
pub mod util;
