//! Bidirectional mapping between Tether object graphs and triple stores.
//!
//! This crate is the heart of Tether. It provides:
//! - `GraphStorer` -- writes objects as `rdf:type`, property, parent and
//!   follows statements, replacing stale statements by difference
//! - `GraphLoader` -- constructs objects from statements and refreshes mapped
//!   objects in place
//! - `GraphRemover` -- deletes the statements of destroyed objects and
//!   collects orphaned anonymous nodes
//! - `ObjectNodeMap` -- the two-way object/node identity map
//! - `ObjectMapper` -- a change-tracked session committing through a
//!   `TransactionManager` and reloading changes committed elsewhere
//! - Policy and vocabulary configuration

pub mod config;
pub mod error;
pub mod gc;
pub mod list;
pub mod loader;
pub mod map;
pub mod mapper;
pub mod remover;
pub mod storer;

pub use config::{
    AbsentPropertyPolicy, BlankNodePolicy, FollowFlag, FollowPolicy, LoadConfig, MapperConfig,
    PropertyStorePolicy, StoreConfig, Vocabulary,
};
pub use error::{LoadError, LoadResult, MapperError, MapperResult};
pub use gc::collect_garbage;
pub use list::{read_list, write_list};
pub use loader::GraphLoader;
pub use map::{sync_map, NodeMap, ObjectMap, ObjectNodeMap};
pub use mapper::{CommitSummary, ObjectMapper};
pub use remover::GraphRemover;
pub use storer::GraphStorer;
