//! Core engine for the `tasks` checklist file.

pub mod config;
pub mod edit;
pub mod editor;
pub mod resolve;
pub mod store;
pub mod task;

#[cfg(test)]
mod test_env;
