pub mod cache;
pub mod item;
pub mod source;
pub mod state;

pub use cache::CacheDoc;
pub use item::FeedItem;
pub use source::{FeedSource, SourceId};
pub use state::{FeedStatus, ReadState};
