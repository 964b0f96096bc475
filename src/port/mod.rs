//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the seams between the pipeline and the outside world:
//!
//! - [`OrderPages`] / [`RegionDirectory`] - upstream market API
//! - [`SnapshotStore`] - authenticated versioned content store (write path)
//! - [`PublishedReader`] - public unauthenticated read path, used by the
//!   freshness gate so freshness checks never consume write-side rate limits
//!
//! Adapters implement these against real services; tests implement them with
//! in-memory fakes.

mod market;
mod store;

pub use market::{OrderPage, OrderPages, PageError, RegionDirectory};
pub use store::{FileEntry, PublishTarget, PublishedReader, RemoteContent, SnapshotStore};
