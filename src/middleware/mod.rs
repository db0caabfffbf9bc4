pub mod auth;
pub mod validator;

pub use auth::{AuthUser, MaybeAuthUser, VerifiedUser};
pub use validator::ValidatedJson;
