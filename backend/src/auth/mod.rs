//! Authentication module
//!
//! JWT access/refresh tokens, bcrypt password hashing, the refresh-token
//! cookie and the request extractors that enforce authentication and roles.

mod cookie;
mod jwt;
mod middleware;
mod password;

pub use cookie::{refresh_token_from, RefreshCookie, ACCESS_COOKIE, REFRESH_COOKIE};
pub use jwt::{Claims, JwtKeys, TokenError, TokenKind, TokenPair, TokenService};
pub use middleware::{access_token_from, AdminUser, CurrentUser, ModeratorUser};
pub use password::PasswordService;
