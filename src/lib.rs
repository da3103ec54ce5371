//! # git-history-rewrite
//!
//! A CLI tool to rewrite the dates and order of a branch's commits through an
//! editable record.
//!
//! The rewrite happens in two phases:
//! - `generate` captures the branch's first-parent history (hash, message,
//!   UTC date) into `commit_record.json`, merging commits made within the
//!   same second
//! - `apply` rebuilds the branch on a fresh orphan branch, one commit per
//!   record entry, then swaps it in under the original name
//!
//! Between the two, the record can be edited freely: reorder, drop or
//! re-date entries, or reword messages.
//!
//! ## Usage
//!
//! ```bash
//! git-history-rewrite generate
//! $EDITOR commit_record.json
//! git-history-rewrite apply
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface and main entry point
//! - [`git`] - Git command wrappers behind the [`git::HistoryRepo`] trait
//! - [`record`] - The record file format and date deduplication
//! - [`recorder`] - The `generate` phase
//! - [`replayer`] - The `apply` phase
//! - [`prompt`] - Confirmation prompt abstraction
//! - [`banner`] - Decorative CLI banner
//! - [`error`] - Error type shared by all modules

pub mod banner;
pub mod cli;
pub mod error;
pub mod git;
pub mod prompt;
pub mod record;
pub mod recorder;
pub mod replayer;

#[cfg(test)]
mod test_support;
