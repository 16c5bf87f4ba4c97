// Configuration loading

pub mod settings;

pub use settings::{CommitMode, ConfigError, GridSettings};
