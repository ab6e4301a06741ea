// Authentication module
// Credential storage, bearer injection, token refresh and session flows

mod authenticator;
mod credentials;
mod manager;
mod refresh;
mod types;

pub use authenticator::{set_bearer, Authenticator};
pub use credentials::{CredentialStore, MemoryCredentialStore, SqliteCredentialStore};
pub use manager::SessionManager;
pub use refresh::{AttemptContext, RefreshCoordinator, RefreshOutcome, RefreshState};
pub use types::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, OtpRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, SessionCredentials, TokenKind, TokenPair, UserProfile,
    UserRole,
};
