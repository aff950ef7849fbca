//! Activity-source boundary
//!
//! Raw activity codes, the update tuple the source delivers, and the feed
//! that pumps updates into the tracker.

pub mod codes;
mod feed;

pub use codes::ActivityUpdate;
pub use feed::ActivityFeed;
