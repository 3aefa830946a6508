//! Retrieval, windowing, and projection of corporate announcements.

mod api;
mod model;
pub(crate) mod wire;

pub use api::{AnnouncementClient, AnnouncementClientBuilder, CacheMode};
pub use model::AnnouncementRecord;
