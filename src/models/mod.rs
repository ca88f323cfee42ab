pub mod login_token;
pub mod membership;
pub mod profile;
pub mod refresh_token;
pub mod user;

pub use login_token::{LoginToken, TokenKind};
pub use membership::EateryMember;
pub use profile::UserProfile;
pub use refresh_token::RefreshToken;
pub use user::{NewUser, User};
