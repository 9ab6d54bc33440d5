// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! # Authentication Module
//!
//! Bearer-token authentication for the PassOwl API.
//!
//! ## Auth Flow
//!
//! 1. The client derives a login verifier hash from the master password and
//!    the user's login salt (client-side; the password never leaves the
//!    client)
//! 2. `POST /auth/login` compares the verifier against the stored hash and
//!    issues an HS256 JWT embedding username + roles, valid for 30 minutes
//! 3. Subsequent requests send `Authorization: Bearer <token>`; the `Auth`
//!    extractor verifies the signature and expiry and resolves the subject
//!    against the identity directory
//!
//! ## Security
//!
//! - All endpoints except register/login/salts and health require a token
//! - The role set is fixed at issuance; there is no refresh flow
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod roles;
pub mod token;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use roles::Role;
pub use token::TokenSigner;
