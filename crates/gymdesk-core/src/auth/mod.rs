//! Authentication: token decoding, session state and stored credentials.
//!
//! - `jwt`: reads role and gym claims out of the access token
//! - `Role`: the five platform roles, ordered by privilege
//! - `Session`: the current login, persisted to disk until the token expires
//! - `CredentialStore`: OS keychain storage for the remembered password

pub mod credentials;
pub mod jwt;
pub mod role;
pub mod session;

pub use credentials::CredentialStore;
pub use jwt::{decode_claims, Claims, JwtError};
pub use role::Role;
pub use session::{Session, SessionData};
