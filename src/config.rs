// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the vault database file | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TOKEN_SECRET` | HS256 signing secret for bearer tokens | dev fallback |
//! | `TOKEN_TTL_MINUTES` | Bearer token validity window | `30` |
//! | `SEED_ADMIN_USERNAME` | Username granted the admin role at registration | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the data directory path.
///
/// The vault database file is created inside this directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "/data";

/// File name of the embedded database inside the data directory.
pub const DATABASE_FILE: &str = "vault.redb";

/// Environment variable name for the token signing secret.
pub const TOKEN_SECRET_ENV: &str = "TOKEN_SECRET";

/// Development-only fallback secret. MUST be overridden in production.
pub const DEV_TOKEN_SECRET: &str = "passowl-dev-secret-change-me";

/// Environment variable name for the token TTL in minutes.
pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_MINUTES";

/// Default bearer token validity window in minutes. Expiry forces
/// re-authentication; there is no refresh-token flow.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// Environment variable naming a user that receives the admin role when it
/// registers.
pub const SEED_ADMIN_ENV: &str = "SEED_ADMIN_USERNAME";
