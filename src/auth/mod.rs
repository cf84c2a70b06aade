//! OAuth2 token lifecycle
//!
//! Client side of the authorization code flow, with and without PKCE, plus
//! the token inspection helpers that go with it. Every operation takes the
//! [`AppConfiguration`](crate::config::AppConfiguration) by reference and
//! returns an [`AuthResult`](crate::error::AuthResult).
//!
//! # Module Layout
//!
//! - [`random`]      -- secure random CSRF tokens and verifiers
//! - [`pkce`]        -- PKCE verifier and S256 challenge
//! - [`state`]       -- the `state` envelope
//! - [`authorize`]   -- authorization URL and callback parameters
//! - [`csrf`]        -- CSRF check of the callback
//! - [`session`]     -- per-browser-session storage
//! - [`exchange`]    -- token endpoint grants
//! - [`claims`]      -- unverified JWT claim extraction
//! - [`oidc`]        -- `c_hash` / `s_hash` / `at_hash` validation
//! - [`flow`]        -- the full round trip
//! - [`token_store`] -- keyring persistence for the CLI

pub mod authorize;
pub mod claims;
pub mod csrf;
pub mod exchange;
pub mod flow;
pub mod oidc;
pub mod pkce;
pub mod random;
pub mod session;
pub mod state;
pub mod token_store;

pub use authorize::{build_authorization_url, CallbackParams};
pub use claims::{decode_token, extract_claims, TokenClaims, TokenHeader};
pub use exchange::{ClientProof, TokenClient, TokenResponse};
pub use flow::{AuthFlow, Authorization};
pub use oidc::{validate_hash, HashKind, HashOutcome};
pub use pkce::PkceVerifier;
pub use session::{AuthSession, MemorySessionStore, SessionStore};
