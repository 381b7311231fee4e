//! Token issuance for the tablegate gateway.
//!
//! Implements the OAuth2 `client_credentials` grant only: machine clients
//! authenticate with a generated id/secret pair and receive a short-lived
//! HS256-signed bearer token. Verification of inbound bearer tokens on the
//! data routes is supplied by an external layer, not this crate.

pub mod clients;
pub mod error;
pub mod jwt;
pub mod token;

pub use clients::ClientDirectory;
pub use error::AuthError;
pub use jwt::{AccessTokenClaims, JwtError, JwtService};
pub use token::{TokenState, token_handler};
