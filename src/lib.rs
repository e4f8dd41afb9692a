//! # tea-indexer
//!
//! Indexes closed pull requests from GitHub into SQLite and serves team
//! dashboard metrics over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  Upstream   │──▶│   Indexer   │──▶│    SQLite    │
//! │ GitHub REST │   │ page+window │   │pull_requests │
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            │
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌──────────┐
//!                 │   CLI    │         │   HTTP   │
//!                 │  (tea)   │         │ (axum)   │
//!                 └──────────┘         └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tea init                                             # create database
//! tea index octo/demo --start 2024-01-01 --end 2024-01-31
//! tea index-all --start 2024-01-01 --end 2024-01-31    # every configured repo
//! tea serve                                            # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Upstream, storage and window error types |
//! | [`models`] | Core data types |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`store`] | Pull request storage handle |
//! | [`upstream`] | GitHub API client |
//! | [`indexer`] | Paginated, date-bounded indexing |
//! | [`query`] | Dashboard, counts and listings |
//! | [`mock`] | Fallback dashboard data |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod error;
pub mod indexer;
pub mod migrate;
pub mod mock;
pub mod models;
pub mod query;
pub mod server;
pub mod store;
pub mod upstream;
