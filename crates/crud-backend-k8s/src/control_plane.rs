// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use kube::api::{
	DeleteParams, GetParams, ListParams, LogParams, Patch, PatchParams, PostParams,
	PropagationPolicy as KubePropagationPolicy,
};
use kube::core::Request;
use kube::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{K8sError, K8sResult};
use crate::identity::Identity;
use crate::resource::{DryRun, PatchStrategy, PropagationPolicy, ResourceRef, Selectors};

/// Control-plane operations, bound to exactly one identity.
///
/// Resource bodies are opaque JSON: whatever the API server returns is handed
/// back untouched. Each method is exactly one round trip; retries, if any,
/// belong to the transport underneath.
#[async_trait]
pub trait ControlPlane: Send + Sync {
	/// The identity every call on this handle is attributed to.
	fn identity(&self) -> &Identity;

	/// Get a single named object.
	async fn get(&self, target: &ResourceRef) -> K8sResult<Value>;

	/// List a collection, filtered server-side by `selectors`.
	async fn list(&self, target: &ResourceRef, selectors: &Selectors) -> K8sResult<Value>;

	/// Create an object in the collection addressed by `target`.
	async fn create(&self, target: &ResourceRef, body: &Value, dry_run: DryRun) -> K8sResult<Value>;

	/// Delete a single named object.
	async fn delete(&self, target: &ResourceRef, propagation: PropagationPolicy)
		-> K8sResult<Value>;

	/// Patch a single named object.
	async fn patch(
		&self,
		target: &ResourceRef,
		body: &Value,
		strategy: PatchStrategy,
	) -> K8sResult<Value>;

	/// Read the logs of a pod, optionally of one container.
	async fn logs(&self, target: &ResourceRef, container: Option<&str>) -> K8sResult<String>;
}

/// [`ControlPlane`] backed by a `kube` client.
///
/// Requests are built from the raw collection path so built-in and custom
/// resources go through the same code and come back as plain JSON.
pub struct KubeControlPlane {
	identity: Identity,
	client: Client,
}

impl KubeControlPlane {
	pub fn new(identity: Identity, client: Client) -> Self {
		Self { identity, client }
	}

	fn request(target: &ResourceRef) -> Request {
		Request::new(target.collection_path())
	}

	async fn send(&self, target: &ResourceRef, req: http::Request<Vec<u8>>) -> K8sResult<Value> {
		self
			.client
			.request::<Value>(req)
			.await
			.map_err(|e| K8sError::from_kube(e, &target.kind.kind, target.name.as_deref()))
	}
}

impl std::fmt::Debug for KubeControlPlane {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KubeControlPlane")
			.field("identity", &self.identity)
			.finish_non_exhaustive()
	}
}

fn to_kube_propagation(policy: PropagationPolicy) -> KubePropagationPolicy {
	match policy {
		PropagationPolicy::Foreground => KubePropagationPolicy::Foreground,
		PropagationPolicy::Background => KubePropagationPolicy::Background,
		PropagationPolicy::Orphan => KubePropagationPolicy::Orphan,
	}
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
	fn identity(&self) -> &Identity {
		&self.identity
	}

	#[instrument(skip_all, fields(identity = %self.identity, target = %target))]
	async fn get(&self, target: &ResourceRef) -> K8sResult<Value> {
		let name = target.require_name()?;
		let req = Self::request(target).get(name, &GetParams::default())?;
		self.send(target, req).await
	}

	#[instrument(skip_all, fields(identity = %self.identity, target = %target, selectors = ?selectors))]
	async fn list(&self, target: &ResourceRef, selectors: &Selectors) -> K8sResult<Value> {
		let mut lp = ListParams::default();
		if let Some(labels) = &selectors.label_selector {
			lp = lp.labels(labels);
		}
		if let Some(fields) = &selectors.field_selector {
			lp = lp.fields(fields);
		}
		let req = Self::request(target).list(&lp)?;
		self.send(target, req).await
	}

	#[instrument(skip_all, fields(identity = %self.identity, target = %target))]
	async fn create(
		&self,
		target: &ResourceRef,
		body: &Value,
		dry_run: DryRun,
	) -> K8sResult<Value> {
		let pp = PostParams {
			dry_run: dry_run == DryRun::All,
			..Default::default()
		};
		let data = serde_json::to_vec(body).map_err(|e| K8sError::InvalidRequest {
			message: format!("failed to encode {} body: {e}", target.kind.kind),
		})?;
		let req = Self::request(target).create(&pp, data)?;
		let created = self.send(target, req).await?;
		debug!(dry_run = pp.dry_run, "created object");
		Ok(created)
	}

	#[instrument(skip_all, fields(identity = %self.identity, target = %target, propagation = propagation.as_str()))]
	async fn delete(
		&self,
		target: &ResourceRef,
		propagation: PropagationPolicy,
	) -> K8sResult<Value> {
		let name = target.require_name()?;
		let dp = DeleteParams {
			propagation_policy: Some(to_kube_propagation(propagation)),
			..Default::default()
		};
		let req = Self::request(target).delete(name, &dp)?;
		self.send(target, req).await
	}

	#[instrument(skip_all, fields(identity = %self.identity, target = %target))]
	async fn patch(
		&self,
		target: &ResourceRef,
		body: &Value,
		strategy: PatchStrategy,
	) -> K8sResult<Value> {
		let name = target.require_name()?;
		let patch = match strategy {
			PatchStrategy::Merge => Patch::Merge(body),
			PatchStrategy::StrategicMerge => Patch::Strategic(body),
		};
		let req = Self::request(target).patch(name, &PatchParams::default(), &patch)?;
		self.send(target, req).await
	}

	#[instrument(skip_all, fields(identity = %self.identity, target = %target, container = ?container))]
	async fn logs(&self, target: &ResourceRef, container: Option<&str>) -> K8sResult<String> {
		let name = target.require_name()?;
		let lp = LogParams {
			container: container.map(str::to_string),
			..Default::default()
		};
		let req = Self::request(target).logs(name, &lp)?;
		self
			.client
			.request_text(req)
			.await
			.map_err(|e| K8sError::from_kube(e, &target.kind.kind, Some(name)))
	}
}
