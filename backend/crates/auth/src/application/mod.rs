//! Application Layer
//!
//! Use cases and application services.

pub mod bearer;
pub mod change_password;
pub mod check_session;
pub mod config;
pub mod forgot_password;
pub mod oauth_sign_in;
pub mod resend_verification;
pub mod reset_password;
pub mod session_manager;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod token_issuer;
pub mod verify_email;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordOutput, ChangePasswordUseCase};
pub use check_session::{CheckSessionUseCase, UserSummary};
pub use config::{AuthConfig, ConfigError};
pub use forgot_password::ForgotPasswordUseCase;
pub use oauth_sign_in::{
    AuthorizationRedirect, OAuthCallbackInput, OAuthProviders, OAuthSignInUseCase,
};
pub use resend_verification::ResendVerificationUseCase;
pub use reset_password::{ResetPasswordInput, ResetPasswordUseCase};
pub use session_manager::{IssuedSession, SessionManager, ValidatedSession};
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use token_issuer::TokenIssuer;
pub use verify_email::VerifyEmailUseCase;
