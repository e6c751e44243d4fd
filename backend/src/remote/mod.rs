mod fetcher;

pub use fetcher::{FetchError, ImageFetcher};
