//! Core library for Stashnotes — a local, reactive note store.
//!
//! The primary entry point is [`NoteStore`], the context object an
//! application creates at startup and hands to every view. All mutations go
//! through its `add_note`, `update_note` and `delete_note` methods; views call
//! [`NoteStore::subscribe_search`] once and then receive a fresh, ordered
//! result whenever a mutation changes it.
//!
//! ```rust
//! use stashnotes_core::NoteStore;
//!
//! let store = NoteStore::in_memory().unwrap();
//! let (initial, updates) = store.subscribe_search("milk");
//! assert!(initial.is_empty());
//!
//! store.add_note("Milk", "buy 2%").unwrap();
//! let latest = updates.try_recv().unwrap();
//! assert_eq!(latest[0].title, "Milk");
//! ```
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    backend::{Backend, MemoryBackend},
    config::{config_file_path, default_database_path, load_config, save_config, StoreConfig},
    delete::DeletePolicy,
    dispatch::{validate_note, MutationDispatcher, MutationQueue, MutationTicket},
    error::{Result, StashError},
    note::{Note, NoteId},
    operation::Operation,
    operation_log::{OperationLog, OperationSummary, PurgeStrategy},
    repository::Repository,
    search::{listing_order, search, MatchMode, SearchQuery},
    storage::SqliteBackend,
    store::NoteStore,
    subscription::{Subscription, SubscriptionId, SubscriptionRegistry},
};
