//! # isobib-client
//!
//! A Rust client for the ISO standards registry.
//!
//! Resolves a free-text citation like `"ISO 9000-1:2015"` or
//! `"ISO 9000 (all parts)"` into a single bibliographic record: the
//! reference is parsed into its components, one registry search fetches
//! the candidate list, and the candidates are ranked and filtered
//! locally — retrying across document-stage prefixes and falling back to
//! a sibling registry — until one item (or an all-parts aggregate with
//! relation links) remains.
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn example() -> isobib_client::error::Result<()> {
//! use isobib_client::{GetOptions, IsoClient, IsoResolver};
//!
//! let resolver = IsoResolver::new(IsoClient::new());
//!
//! // Resolve a dated reference to one edition.
//! if let Some(item) = resolver.get("ISO 19115-1", Some("2014"), &GetOptions::default()).await? {
//!     println!("{}", item.id);
//! }
//!
//! // Aggregate a whole multi-part family.
//! if let Some(item) = resolver.get("ISO 2146 (all parts)", None, &GetOptions::default()).await? {
//!     println!("{} ({} sibling parts)", item.id, item.relations.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod hit;
pub mod reference;
pub mod resolve;
pub mod search;
pub mod types;

// Re-export key types at the crate root.
pub use client::IsoClient;
pub use error::IsoError;
pub use hit::{EffectiveDate, Hit, HitCollection};
pub use reference::ParsedReference;
pub use resolve::{GetOptions, IsoResolver, NoSibling, SiblingRegistry};
pub use types::*;
