//! Durable session storage and client-side routing.
//!
//! The admin bearer token lives in a key-value store that survives
//! restarts. The router tracks which page the client is on, which decides
//! whether an unauthorized response tears the admin session down.

mod router;
mod storage;

pub use router::{Navigator, RouteInfo, Router};
pub use storage::{MemorySessionStore, SessionStore, SqliteSessionStore};

/// Key holding the admin bearer token.
pub const ADMIN_TOKEN_KEY: &str = "adminToken";

/// Key holding the serialized admin user profile.
pub const ADMIN_USER_KEY: &str = "adminUser";

/// Route the client is sent to when the admin session is rejected.
pub const ADMIN_LOGIN_ROUTE: &str = "/admin/login";

/// Every route under this prefix belongs to the admin panel.
pub const ADMIN_ROUTE_PREFIX: &str = "/admin";
