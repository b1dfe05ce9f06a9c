// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::CrudBackendConfigLayer;
use crate::sections::{AuthConfigLayer, CacheConfigLayer, KubeConfigLayer, LoggingConfigLayer};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/crud-backend/config.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<CrudBackendConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<CrudBackendConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(CrudBackendConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is skipped.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<CrudBackendConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(CrudBackendConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: CrudBackendConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: CRUD_BACKEND_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<CrudBackendConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from_env(&Env(|name: &str| std::env::var(name).ok()))
	}
}

/// Variable lookup, so tests can supply a fixed environment.
struct Env<F: Fn(&str) -> Option<String>>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
		match self.var(name) {
			Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => Ok(Some(true)),
			Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => Ok(Some(false)),
			Some(v) => Err(ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid boolean value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn usize(&self, name: &str) -> Result<Option<usize>, ConfigError> {
		self.parsed(name)
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|e| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("'{v}': {e}"),
			}),
			None => Ok(None),
		}
	}
}

fn load_from_env<F: Fn(&str) -> Option<String>>(
	env: &Env<F>,
) -> Result<CrudBackendConfigLayer, ConfigError> {
	Ok(CrudBackendConfigLayer {
		kube: Some(KubeConfigLayer {
			kubeconfig: env.var("CRUD_BACKEND_KUBECONFIG").map(PathBuf::from),
			context: env.var("CRUD_BACKEND_KUBE_CONTEXT"),
			prefer_in_cluster: env.bool("CRUD_BACKEND_KUBE_PREFER_IN_CLUSTER")?,
		}),
		cache: Some(CacheConfigLayer {
			core_capacity: env.usize("CRUD_BACKEND_CACHE_CORE_CAPACITY")?,
			storage_capacity: env.usize("CRUD_BACKEND_CACHE_STORAGE_CAPACITY")?,
			custom_objects_capacity: env.usize("CRUD_BACKEND_CACHE_CUSTOM_OBJECTS_CAPACITY")?,
		}),
		auth: Some(AuthConfigLayer {
			userid_header: env.var("CRUD_BACKEND_USERID_HEADER"),
			userid_prefix: env.var("CRUD_BACKEND_USERID_PREFIX"),
			disable_auth: env.bool("CRUD_BACKEND_DISABLE_AUTH")?,
			gate_mode: env.parsed("CRUD_BACKEND_AUTH_GATE_MODE")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: env.var("CRUD_BACKEND_LOG_LEVEL"),
			format: env.parsed("CRUD_BACKEND_LOG_FORMAT")?,
		}),
	})
}
