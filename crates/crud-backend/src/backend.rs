// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wiring from resolved configuration to a ready [`ResourceAccess`].

use std::sync::Arc;

use crud_backend_config::{AuthConfig, AuthGateMode, CacheConfig, CrudBackendConfig, KubeConfig};
use crud_backend_k8s::{
	AmbientCredential, AuthorizationGate, CacheCapacities, ClientRegistry, CredentialOptions,
	GateMode, HeaderIdentitySource, K8sError, K8sResult, KubeClientFactory, RequestContext,
	ResourceAccess, SubjectAccessReviewer,
};
use http::{HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;

pub fn credential_options(kube: &KubeConfig) -> CredentialOptions {
	CredentialOptions {
		kubeconfig: kube.kubeconfig.clone(),
		context: kube.context.clone(),
		prefer_in_cluster: kube.prefer_in_cluster,
	}
}

pub fn cache_capacities(cache: &CacheConfig) -> CacheCapacities {
	CacheCapacities {
		core: cache.core_capacity,
		storage: cache.storage_capacity,
		custom_objects: cache.custom_objects_capacity,
	}
}

pub fn gate_mode(mode: AuthGateMode) -> GateMode {
	match mode {
		AuthGateMode::Selective => GateMode::Selective,
		AuthGateMode::Strict => GateMode::Strict,
	}
}

/// Build the access layer around an already resolved ambient credential.
///
/// The reviewer always runs as the service itself; only resource calls
/// impersonate.
pub fn build_access(
	config: &CrudBackendConfig,
	credential: AmbientCredential,
) -> K8sResult<ResourceAccess> {
	let factory = Arc::new(KubeClientFactory::new(credential));
	let reviewer = Arc::new(SubjectAccessReviewer::new(factory.ambient_client()?));
	let gate = AuthorizationGate::new(reviewer, gate_mode(config.auth.gate_mode))
		.with_auth_disabled(config.auth.disable_auth);
	let registry = ClientRegistry::new(factory, cache_capacities(&config.cache));

	Ok(ResourceAccess::new(Arc::new(registry), Arc::new(gate)))
}

/// Resolve the request context for one CLI invocation.
///
/// `--as` is presented the way an authenticating proxy would present it: as
/// the configured user id header, prefix included.
pub fn request_context(
	auth: &AuthConfig,
	as_identity: Option<&str>,
	cancellation: CancellationToken,
) -> K8sResult<RequestContext> {
	let source = HeaderIdentitySource::new(
		&auth.userid_header,
		auth.userid_prefix.clone(),
		auth.disable_auth,
	)?;

	let mut headers = HeaderMap::new();
	if let Some(user) = as_identity {
		let value = format!("{}{}", auth.userid_prefix, user);
		let value = HeaderValue::from_str(&value).map_err(|e| K8sError::Unauthenticated {
			message: format!("identity '{user}' cannot be sent as a header: {e}"),
		})?;
		headers.insert(source.header().clone(), value);
	}

	Ok(RequestContext::from_source(&source.for_headers(&headers))?.with_cancellation(cancellation))
}
