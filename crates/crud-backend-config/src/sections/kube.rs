// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cluster credential discovery section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KubeConfigLayer {
	pub kubeconfig: Option<PathBuf>,
	pub context: Option<String>,
	pub prefer_in_cluster: Option<bool>,
}

impl KubeConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.kubeconfig.is_some() {
			self.kubeconfig = other.kubeconfig;
		}
		if other.context.is_some() {
			self.context = other.context;
		}
		if other.prefer_in_cluster.is_some() {
			self.prefer_in_cluster = other.prefer_in_cluster;
		}
	}

	pub fn finalize(self) -> KubeConfig {
		KubeConfig {
			kubeconfig: self.kubeconfig,
			context: self.context,
			prefer_in_cluster: self.prefer_in_cluster.unwrap_or(true),
		}
	}
}

/// Where to find the service's own cluster credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KubeConfig {
	/// Explicit kubeconfig; disables in-cluster discovery when set.
	pub kubeconfig: Option<PathBuf>,
	pub context: Option<String>,
	pub prefer_in_cluster: bool,
}

impl Default for KubeConfig {
	fn default() -> Self {
		KubeConfigLayer::default().finalize()
	}
}
