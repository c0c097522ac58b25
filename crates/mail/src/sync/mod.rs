//! Fetch pipeline from Gmail into decoded emails

mod inbox;

pub use inbox::{FetchError, FetchOptions, FetchOutcome, FetchStats, fetch_emails};
