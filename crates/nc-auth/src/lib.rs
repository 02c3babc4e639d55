//! # nc-auth
//!
//! Authentication and authorization for NC Ops.
//!
//! ## Features
//!
//! - Argon2 password hashing
//! - In-memory sessions with an idle timeout, carried by cookie or bearer header
//! - Role-based permissions for the NC and management roles

pub mod middleware;
pub mod password;
pub mod permissions;
pub mod session;

pub use middleware::{AuthError, Authenticator, RequestHeaders};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{CurrentUser, Permission};
pub use session::{CookieConfig, MemorySessionStore, SameSite, Session, SessionError, SessionStore};
