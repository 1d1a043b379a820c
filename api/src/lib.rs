//! Strata Cloud Manager REST client implementing [`scm_core::ObjectStore`].
//!
//! Authentication is OAuth2 client credentials scoped to one tenant service
//! group. No retries and no token refresh.

mod client;
pub mod wire;

pub use client::ScmApiClient;
