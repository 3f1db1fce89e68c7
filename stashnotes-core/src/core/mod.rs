//! Internal domain modules for the Stashnotes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod backend;
pub mod config;
pub mod delete;
pub mod dispatch;
pub mod error;
pub mod note;
pub mod operation;
pub mod operation_log;
pub mod repository;
pub mod search;
pub mod storage;
pub mod store;
pub mod subscription;

#[doc(inline)]
pub use backend::{Backend, MemoryBackend};
#[doc(inline)]
pub use config::{config_file_path, default_database_path, load_config, save_config, StoreConfig};
#[doc(inline)]
pub use delete::DeletePolicy;
#[doc(inline)]
pub use dispatch::{validate_note, MutationDispatcher, MutationQueue, MutationTicket};
#[doc(inline)]
pub use error::{Result, StashError};
#[doc(inline)]
pub use note::{Note, NoteId};
#[doc(inline)]
pub use operation::Operation;
#[doc(inline)]
pub use operation_log::{OperationLog, OperationSummary, PurgeStrategy};
#[doc(inline)]
pub use repository::Repository;
#[doc(inline)]
pub use search::{listing_order, search, MatchMode, SearchQuery};
#[doc(inline)]
pub use storage::SqliteBackend;
#[doc(inline)]
pub use store::NoteStore;
#[doc(inline)]
pub use subscription::{Subscription, SubscriptionId, SubscriptionRegistry};
