//! Async client for the Odoo external API over XML-RPC.
//!
//! ```no_run
//! use odoors_xmlrpc::odoo::Odoo;
//! use serde_json::Value;
//!
//! # async fn demo() -> odoors_xmlrpc::error::Result<()> {
//! let odoo = Odoo::new_and_login("http://localhost:8069", "db", "admin", "admin").await?;
//! let partners: Vec<Value> = odoo
//!     .search_and_read("res.partner", (("is_company", "=", true),), Some(vec!["name"]), None, Some(5))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod debug_sql;
pub mod error;
pub mod odoo;
pub mod pprint;
pub mod transport;
pub mod xmlrpc;

pub use config::OdooConfig;
pub use error::{Error, Result};
pub use odoo::Odoo;
