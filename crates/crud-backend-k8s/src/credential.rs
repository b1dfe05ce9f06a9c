// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Resolution of the service's own (ambient) cluster credential.
//!
//! This runs once at process start. A failure here is fatal: the caller is
//! expected to abort startup rather than serve requests without a credential.

use std::fmt;
use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config;
use tracing::{debug, info, instrument};

use crate::error::{K8sError, K8sResult};

/// Where the ambient credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
	InCluster,
	Kubeconfig,
}

impl fmt::Display for CredentialOrigin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CredentialOrigin::InCluster => f.write_str("in-cluster"),
			CredentialOrigin::Kubeconfig => f.write_str("kubeconfig"),
		}
	}
}

/// Knobs for locating the ambient credential.
#[derive(Debug, Clone)]
pub struct CredentialOptions {
	/// Explicit kubeconfig file. When set, in-cluster discovery is skipped.
	pub kubeconfig: Option<PathBuf>,
	/// Kubeconfig context to use instead of the current one.
	pub context: Option<String>,
	/// Try the in-cluster service account before any kubeconfig.
	pub prefer_in_cluster: bool,
}

impl Default for CredentialOptions {
	fn default() -> Self {
		Self {
			kubeconfig: None,
			context: None,
			prefer_in_cluster: true,
		}
	}
}

/// The service's own operating credential.
#[derive(Debug, Clone)]
pub struct AmbientCredential {
	config: Config,
	origin: CredentialOrigin,
}

impl AmbientCredential {
	/// Wrap an already-built config, e.g. one pointing at a test API server.
	pub fn from_config(config: Config, origin: CredentialOrigin) -> Self {
		Self { config, origin }
	}

	/// Resolve the credential: in-cluster first (unless disabled or an explicit
	/// kubeconfig is given), then the local kubeconfig.
	#[instrument(skip(options), fields(kubeconfig = ?options.kubeconfig, context = ?options.context))]
	pub async fn resolve(options: &CredentialOptions) -> K8sResult<Self> {
		let mut in_cluster_error = None;

		if options.prefer_in_cluster && options.kubeconfig.is_none() {
			match Config::incluster() {
				Ok(config) => {
					info!(cluster_url = %config.cluster_url, "using in-cluster credential");
					return Ok(Self::from_config(config, CredentialOrigin::InCluster));
				}
				Err(e) => {
					debug!(error = %e, "in-cluster credential unavailable, trying kubeconfig");
					in_cluster_error = Some(e.to_string());
				}
			}
		}

		let kube_options = KubeConfigOptions {
			context: options.context.clone(),
			..Default::default()
		};

		let loaded = match &options.kubeconfig {
			Some(path) => match Kubeconfig::read_from(path) {
				Ok(kubeconfig) => Config::from_custom_kubeconfig(kubeconfig, &kube_options).await,
				Err(e) => Err(e),
			},
			None => Config::from_kubeconfig(&kube_options).await,
		};

		match loaded {
			Ok(config) => {
				info!(cluster_url = %config.cluster_url, "using kubeconfig credential");
				Ok(Self::from_config(config, CredentialOrigin::Kubeconfig))
			}
			Err(e) => {
				let message = match in_cluster_error {
					Some(in_cluster) => {
						format!(
							"no in-cluster credential ({in_cluster}) and no usable kubeconfig ({e})"
						)
					}
					None => format!("no usable kubeconfig ({e})"),
				};
				Err(K8sError::Configuration { message })
			}
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn origin(&self) -> CredentialOrigin {
		self.origin
	}
}
