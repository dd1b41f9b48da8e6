// src/watch/mod.rs

//! Watch bookkeeping owned by the engine thread.
//!
//! This module is responsible for:
//! - per-watch state ([`WatchRecord`]) and its tuning ([`WatchOptions`]),
//! - sharing one directory subscription between watches ([`DirectoryGroups`]),
//! - remembering events for rate-limited watches ([`Coalescer`]),
//! - the notification source itself ([`DirectorySubscriber`],
//!   [`NotifySubscriber`]) and a recording [`mock::MockSubscriber`].
//!
//! It does **not** read files or decide when to feed; that is the engine's job.

pub mod coalesce;
pub mod group;
pub mod mock;
pub mod options;
pub mod record;
pub mod subscriber;

pub use coalesce::Coalescer;
pub use group::{DirectoryGroup, DirectoryGroups, JoinOutcome};
pub use options::{resolve_encoding, WatchOptions};
pub use record::{WatchRecord, WatchTarget};
pub use subscriber::{translate, DirectorySubscriber, FsEvent, NotifySubscriber, SubscriptionId};
