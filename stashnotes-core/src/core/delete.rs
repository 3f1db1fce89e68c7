//! Policy for deleting a note that does not exist.
//!
//! Callers have to pick one explicitly, since the two policies are
//! observably different: under [`DeletePolicy::Strict`] a second delete of the
//! same ID fails, under [`DeletePolicy::Idempotent`] it succeeds and reports
//! that nothing was removed.
//!
//! ```rust
//! use stashnotes_core::DeletePolicy;
//!
//! let json = serde_json::to_string(&DeletePolicy::Idempotent).unwrap();
//! assert_eq!(json, r#""Idempotent""#);
//! assert_eq!(DeletePolicy::default(), DeletePolicy::Strict);
//! ```

use serde::{Deserialize, Serialize};

/// Determines what deleting an absent note does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DeletePolicy {
    /// Deleting an absent note fails with [`StashError::NotFound`](crate::StashError::NotFound).
    #[default]
    Strict,

    /// Deleting an absent note succeeds and returns `false`.
    Idempotent,
}
