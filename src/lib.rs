//! GEARS Dashboard API Library
//!
//! Back office for a youth robotics program: QuickBooks Online customers
//! reconciled against the program's own mentor, student and team records.
//!
//! # Modules
//!
//! - `name_parser`: Company name grammar (`Program - Team - Student`).
//! - `reconcile`: Merges parsed names with cached QBO customers.
//! - `customer_index`: Id lookup with display placeholders.
//! - `listing`: Generic search, sort and pagination for list views.
//! - `views`: Row types for each admin list.
//! - `cache_validator`: Checksummed cache entries.
//! - `customer_cache`: Customer cache provider trait and moka implementation.
//! - `directory`: Cached customer snapshot with repopulation on expiry.
//! - `qbo_client`: QuickBooks Online REST client.
//! - `store`: Postgres CRUD for mentors, students and teams.
//! - `mailer`: Outbound email through an HTTP mail API.
//! - `dashboard`: Dashboard widget data.
//! - `validation`: Input validation for admin-entered records.
//! - `config`: Configuration management.
//! - `db`: Database connection and schema.
//! - `errors`: Error handling types.
//! - `handlers` / `routes`: HTTP API.

pub mod cache_validator;
pub mod config;
pub mod customer_cache;
pub mod customer_index;
pub mod dashboard;
pub mod db;
pub mod directory;
pub mod errors;
pub mod handlers;
pub mod listing;
pub mod mailer;
pub mod models;
pub mod name_parser;
pub mod qbo_client;
pub mod reconcile;
pub mod routes;
pub mod store;
pub mod validation;
pub mod views;
