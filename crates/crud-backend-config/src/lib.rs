// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the CRUD backend.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`CRUD_BACKEND_*`)
//!
//! # Usage
//!
//! ```ignore
//! use crud_backend_config::load_config;
//!
//! let config = load_config()?;
//! println!("gate mode: {}", config.auth.gate_mode);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::CrudBackendConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved backend configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrudBackendConfig {
	pub kube: KubeConfig,
	pub cache: CacheConfig,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`CRUD_BACKEND_*`)
/// 2. Config file (`/etc/crud-backend/config.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<CrudBackendConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<CrudBackendConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<CrudBackendConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(EnvSource)];
	load_from_sources(sources)
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<CrudBackendConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = CrudBackendConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: CrudBackendConfigLayer) -> Result<CrudBackendConfig, ConfigError> {
	let config = CrudBackendConfig {
		kube: layer.kube.unwrap_or_default().finalize(),
		cache: layer.cache.unwrap_or_default().finalize(),
		auth: layer.auth.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		kubeconfig = ?config.kube.kubeconfig,
		context = ?config.kube.context,
		prefer_in_cluster = config.kube.prefer_in_cluster,
		core_capacity = config.cache.core_capacity,
		storage_capacity = config.cache.storage_capacity,
		custom_objects_capacity = config.cache.custom_objects_capacity,
		gate_mode = %config.auth.gate_mode,
		disable_auth = config.auth.disable_auth,
		log_format = %config.logging.format,
		"Backend configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &CrudBackendConfig) -> Result<(), ConfigError> {
	config.cache.validate()?;

	if config.auth.userid_header.trim().is_empty() && !config.auth.disable_auth {
		return Err(ConfigError::Validation(
			"auth.userid_header must name a header unless auth.disable_auth is set".to_string(),
		));
	}

	if config.auth.disable_auth && config.auth.gate_mode == AuthGateMode::Strict {
		return Err(ConfigError::Validation(
			"CRUD_BACKEND_DISABLE_AUTH=true cannot be combined with \
			 CRUD_BACKEND_AUTH_GATE_MODE=strict: strict gating needs a caller identity. \
			 Unset one of them."
				.to_string(),
		));
	}

	Ok(())
}
