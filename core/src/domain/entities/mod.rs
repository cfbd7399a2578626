//! Domain entities representing core business objects.

pub mod token;

// Re-export commonly used types
pub use token::{
    IssuedToken, NewRefreshToken, RefreshTokenRecord,
    DEFAULT_REFRESH_TOKEN_TTL_DAYS,
};
