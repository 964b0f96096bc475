//! Versioned content store adapter (GitHub contents + git-data APIs).

mod client;

pub use client::ContentsClient;
