//! Authentication for the MyRatingIs API
//!
//! Provides:
//! - JWT access-token validation
//! - Bearer and session-cookie credential extraction
//! - Authorization-code exchange with the identity provider

pub mod jwt;
pub mod provider;
pub mod session;

pub use jwt::{Claims, JwtValidator, TokenValidationResult};
pub use provider::{CodeExchanger, DisabledCodeExchanger, HttpCodeExchanger, Session};
pub use session::{bearer_user, cookie_value, extract_token_from_header, session_user};
