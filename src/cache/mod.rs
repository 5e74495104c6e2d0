//! In-memory TTL cache for GET responses.
//!
//! - Entries are keyed by endpoint path plus sorted query parameters
//! - Expiry is checked lazily on read; there is no background sweep
//! - Mutating calls invalidate entries by plain substring match on the key

mod key;
mod response;

pub use key::generate_key;
pub use response::{CacheStats, ResponseCache};
