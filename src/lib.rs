//! gitjump - index Git repositories below a base path and jump to them
//! with fuzzy search.
//!
//! The indexer walks the configured base directory up to a maximum depth,
//! collecting the parent of every `.git` entry it finds into a shared,
//! deduplicated project list. The finder filters that list against a
//! prefixed query string for incremental search.

pub mod cli;
pub mod config;
pub mod debounce;
pub mod finder;
pub mod index;
pub mod state;
