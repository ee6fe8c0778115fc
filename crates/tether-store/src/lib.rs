//! Triple store boundary for Tether.
//!
//! The object mapper never indexes, parses or queries triples itself; it
//! talks to a backing store through the [`TripleStore`] trait. This crate
//! defines that boundary plus a reference backend.
//!
//! # Storage Backends
//!
//! - [`InMemoryTripleStore`] -- indexed `BTreeSet`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Only complete triples are stored; incomplete ones are rejected with
//!    [`StoreError::IncompleteStatement`], never silently dropped.
//! 2. Every URI-bearing argument goes through prefix expansion first.
//! 3. `add` reports duplicates and `remove` reports absence by returning
//!    `false`, so change-sets can record exactly what happened.
//! 4. Change-sets are applied exactly: an entry that does not change the
//!    store is an error ([`StoreError::ChangeNotApplicable`]).

pub mod error;
pub mod memory;
pub mod ntriples;
pub mod prefix;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryTripleStore;
pub use ntriples::{to_ntriples_string, write_ntriples};
pub use prefix::PrefixMap;
pub use traits::{QueryRow, TripleStore};
