// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Construction of identity-bound control-plane clients.

use std::fmt;
use std::sync::Arc;

use http::HeaderValue;
use kube::{Client, Config};
use tracing::debug;

use crate::control_plane::{ControlPlane, KubeControlPlane};
use crate::credential::AmbientCredential;
use crate::error::{K8sError, K8sResult};
use crate::identity::Identity;

/// The API families that get their own client cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiFamily {
	/// Namespaces, pods, PVCs, secrets, events.
	Core,
	/// Storage classes.
	Storage,
	/// Notebooks, pod defaults and any other custom resource.
	CustomObjects,
}

impl fmt::Display for ApiFamily {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ApiFamily::Core => f.write_str("core"),
			ApiFamily::Storage => f.write_str("storage"),
			ApiFamily::CustomObjects => f.write_str("custom-objects"),
		}
	}
}

/// Builds a client bound to one identity.
///
/// Building must be side-effect free: no network traffic, no shared state.
pub trait ClientFactory: Send + Sync {
	fn build(&self, family: ApiFamily, identity: &Identity) -> K8sResult<Arc<dyn ControlPlane>>;
}

/// Production factory: authenticates with the ambient credential and, for a
/// non-empty identity, impersonates it on every request.
#[derive(Debug, Clone)]
pub struct KubeClientFactory {
	credential: AmbientCredential,
}

impl KubeClientFactory {
	pub fn new(credential: AmbientCredential) -> Self {
		Self { credential }
	}

	pub fn credential(&self) -> &AmbientCredential {
		&self.credential
	}

	/// A client for the service's own identity, used for access reviews.
	pub fn ambient_client(&self) -> K8sResult<Client> {
		Client::try_from(self.credential.config().clone()).map_err(|e| {
			K8sError::ClientConstruction {
				identity: Identity::ambient().to_string(),
				message: e.to_string(),
			}
		})
	}

	pub(crate) fn config_for(&self, identity: &Identity) -> K8sResult<Config> {
		let mut config = self.credential.config().clone();
		if identity.is_ambient() {
			return Ok(config);
		}

		HeaderValue::from_str(identity.as_str()).map_err(|e| K8sError::ClientConstruction {
			identity: identity.to_string(),
			message: format!("identity is not a valid impersonation header value: {e}"),
		})?;

		config.auth_info.impersonate = Some(identity.as_str().to_string());
		config.auth_info.impersonate_groups = None;
		Ok(config)
	}
}

impl ClientFactory for KubeClientFactory {
	fn build(&self, family: ApiFamily, identity: &Identity) -> K8sResult<Arc<dyn ControlPlane>> {
		let config = self.config_for(identity)?;
		let client = Client::try_from(config).map_err(|e| K8sError::ClientConstruction {
			identity: identity.to_string(),
			message: e.to_string(),
		})?;
		debug!(%family, %identity, "built control-plane client");
		Ok(Arc::new(KubeControlPlane::new(identity.clone(), client)))
	}
}
