// Core caching module - read-mostly collections with explicit invalidation.
// SnapshotSlot is the publication primitive shared by the movie catalog's
// GenericCache and the moderation rule store.

pub mod cached_collection;
pub mod generic_cache;
pub mod refresh_coordinator;
pub mod snapshot_slot;
pub mod source;

pub use cached_collection::*;
pub use generic_cache::*;
pub use refresh_coordinator::*;
pub use snapshot_slot::*;
pub use source::*;
