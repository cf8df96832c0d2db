//! Builders for test media files and protocol replies

mod media;
mod reply;

pub use media::MediaDir;
pub use reply::FileReplyBuilder;
