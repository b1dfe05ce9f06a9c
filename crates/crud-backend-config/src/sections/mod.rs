// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for crud-backend.

pub mod auth;
pub mod cache;
pub mod kube;
pub mod logging;

pub use auth::{AuthConfig, AuthConfigLayer, AuthGateMode};
pub use cache::{CacheConfig, CacheConfigLayer, DEFAULT_CACHE_CAPACITY};
pub use kube::{KubeConfig, KubeConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
