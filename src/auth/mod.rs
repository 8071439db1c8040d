mod helpers;
mod middleware;
mod session;
mod token;

pub use middleware::{
    AuthError, RequirePlatformAdmin, RequireSchoolAdmin, RequireSchoolUser, RequireUser,
};
pub use session::{SESSION_TTL_DAYS, issue_token, session_expiry};
pub use token::{TokenGenerator, parse_token};
