//! Row-level change feed: typed events, filters and cancellable subscriptions.

pub mod event;
pub mod filter;
pub mod subscription;

pub use event::{ChangeEvent, ChangeKind, Table};
pub use filter::{ChangeFilter, ChannelSpec};
pub use subscription::Subscription;
