//! Remote podcast directory: HTTP client and cached per-section listings

mod client;
mod listings;

pub use client::{DirectoryApi, HttpDirectory};
pub use listings::{PodcastListings, Section};
