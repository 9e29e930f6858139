//! Mailchimp table plugin.
//!
//! Exposes Mailchimp Marketing API resources (campaigns, lists, templates,
//! automations, batches, authorized apps, e-commerce stores) as queryable
//! tables on top of [`tablekit`].
//!
//! # Architecture
//!
//! ```text
//!   POST /api/tables/:name/query
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       TableRegistry (tablekit)           │
//! │  - Validate quals and projection         │
//! │  - Route to list or get                  │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Mailchimp tables                   │
//! │  - Translate quals to API filters        │
//! │  - Paginate, hydrate, build rows         │
//! └─────────────────────────────────────────┘
//!          ↓
//!   MailchimpConnection (cached client + account)
//!          ↓
//!   Mailchimp Marketing API v3
//! ```
//!
//! # Configuration
//!
//! TOML file named by `MAILCHIMP_PLUGIN_CONFIG`; defaults apply when unset.
//! The API key comes from `[connection] api_key` or `MAILCHIMP_API_KEY`.

pub mod api;
pub mod client;
pub mod config;
pub mod connection;
pub mod registry;
pub mod tables;

pub use connection::MailchimpConnection;
pub use registry::build_registry;
