// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client cache sizing section.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CacheConfigLayer {
	pub core_capacity: Option<usize>,
	pub storage_capacity: Option<usize>,
	pub custom_objects_capacity: Option<usize>,
}

impl CacheConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.core_capacity.is_some() {
			self.core_capacity = other.core_capacity;
		}
		if other.storage_capacity.is_some() {
			self.storage_capacity = other.storage_capacity;
		}
		if other.custom_objects_capacity.is_some() {
			self.custom_objects_capacity = other.custom_objects_capacity;
		}
	}

	pub fn finalize(self) -> CacheConfig {
		CacheConfig {
			core_capacity: self.core_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
			storage_capacity: self.storage_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
			custom_objects_capacity: self
				.custom_objects_capacity
				.unwrap_or(DEFAULT_CACHE_CAPACITY),
		}
	}
}

/// Per-family client cache capacities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
	pub core_capacity: usize,
	pub storage_capacity: usize,
	pub custom_objects_capacity: usize,
}

impl CacheConfig {
	/// Every capacity must hold at least one client.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (key, value) in [
			("cache.core_capacity", self.core_capacity),
			("cache.storage_capacity", self.storage_capacity),
			("cache.custom_objects_capacity", self.custom_objects_capacity),
		] {
			if value == 0 {
				return Err(ConfigError::Validation(format!("{key} must be at least 1")));
			}
		}
		Ok(())
	}
}

impl Default for CacheConfig {
	fn default() -> Self {
		CacheConfigLayer::default().finalize()
	}
}
