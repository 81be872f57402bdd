//! `packhub-identity` — identity & access module.
//!
//! Google-token login, user upsert, and JWT issuance. Registers itself as
//! the process-wide [`packhub_runtime::Authenticator`] so other modules can
//! guard their routes without knowing the token format.

pub mod google;
pub mod login;
pub mod module;
pub mod store;
pub mod token;
pub mod user;

pub use google::{GoogleProfile, GoogleTokenVerifier, MockGoogleVerifier};
pub use login::{LoginOutcome, LoginWithGoogle};
pub use module::IdentityModule;
pub use store::UserStore;
pub use token::JwtTokens;
pub use user::User;
