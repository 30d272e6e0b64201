//! Relgate - release-gate dependency auditing.
//!
//! Relgate audits a proposed change (a revision number or an issue key)
//! before release: it determines the files the change touches, walks each
//! file's bounded history, extracts issue references from commit messages,
//! resolves their current status against the tracker, and reports the
//! still-open ones per file.
//!
//! This crate provides both the `relgate` CLI and a library: the
//! [`resolver::Resolver`] core works over any [`history::RevisionLog`] and
//! [`tracker::IssueTracker`] pair.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod app;
pub mod domain;
pub mod error;
pub mod extract;
pub mod history;
pub mod output;
pub mod resolver;
pub mod tracker;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;
