//! The application-facing note store.

use crate::core::dispatch::validate_note;
use crate::core::search::{search, SearchQuery};
use crate::{
    Backend, MemoryBackend, MutationDispatcher, Note, NoteId, Repository, Result, SqliteBackend,
    StoreConfig, Subscription, SubscriptionId, SubscriptionRegistry,
};

/// A reactive note store: the single context object a UI holds.
///
/// `NoteStore` combines a [`Repository`], a [`SubscriptionRegistry`] and a
/// [`MutationDispatcher`]. Mutations are applied one at a time in arrival
/// order, and every live subscription whose result changed has been sent the
/// new result before the mutating call returns. Reads run concurrently and
/// always see whole mutations.
///
/// The store is `Send + Sync`; share it between threads behind an `Arc`.
/// Dropping it ends every outstanding [`Subscription`] stream.
pub struct NoteStore {
    config: StoreConfig,
    repository: Repository,
    subscriptions: SubscriptionRegistry,
    dispatcher: MutationDispatcher,
}

impl NoteStore {
    /// Opens (or creates) the SQLite database named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StashError::InvalidStore`] if the file exists but is
    /// not a Stashnotes database, or any I/O or SQLite failure.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let path = config.resolved_database_path();
        let backend = SqliteBackend::open_or_create(&path, config.operation_log)?;
        log::info!("note store at {}", path.display());
        Self::with_backend(backend, config)
    }

    /// Creates an empty, non-durable store with default settings.
    pub fn in_memory() -> Result<Self> {
        Self::with_backend(MemoryBackend::new(), StoreConfig::default())
    }

    /// Builds a store over any [`Backend`], loading its current records.
    pub fn with_backend<B: Backend + 'static>(backend: B, config: StoreConfig) -> Result<Self> {
        let repository = Repository::open(Box::new(backend), config.delete_policy)?;
        let subscriptions = SubscriptionRegistry::new(config.match_mode);
        Ok(Self {
            config,
            repository,
            subscriptions,
            dispatcher: MutationDispatcher::new(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Creates a note.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StashError::Validation`] if title and content are both
    /// blank (nothing is stored), or a storage error from the backend.
    pub fn add_note(&self, title: impl Into<String>, content: impl Into<String>) -> Result<Note> {
        let (title, content) = (title.into(), content.into());
        validate_note(&title, &content)?;
        self.dispatcher
            .dispatch(&self.repository, &self.subscriptions, |repo| repo.create(title, content))
    }

    /// Replaces the title and content of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StashError::Validation`] for a blank note,
    /// [`crate::StashError::NotFound`] for an unknown or deleted `id`, or a
    /// storage error from the backend.
    pub fn update_note(
        &self,
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Note> {
        let (title, content) = (title.into(), content.into());
        validate_note(&title, &content)?;
        self.dispatcher.dispatch(&self.repository, &self.subscriptions, |repo| {
            repo.update(id, title, content)
        })
    }

    /// Deletes `id`. Returns whether a note was removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StashError::NotFound`] for an absent `id` under
    /// [`crate::DeletePolicy::Strict`], or a storage error from the backend.
    pub fn delete_note(&self, id: NoteId) -> Result<bool> {
        self.dispatcher
            .dispatch(&self.repository, &self.subscriptions, |repo| repo.delete(id))
    }

    /// Starts a live search and returns its current result with the update stream.
    pub fn subscribe_search(&self, query: &str) -> (Vec<Note>, Subscription) {
        self.subscriptions.subscribe(&self.repository, query)
    }

    /// Ends a live search. Returns whether it was still live.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// One-off search against the current state.
    pub fn search(&self, query: &str) -> Vec<Note> {
        let query = SearchQuery::new(query, self.config.match_mode);
        self.repository
            .with_notes(|notes| search(notes.values(), &query))
    }

    pub fn get_note(&self, id: NoteId) -> Option<Note> {
        self.repository.get(id)
    }

    /// All notes in listing order.
    pub fn list_notes(&self) -> Vec<Note> {
        self.search("")
    }
}
