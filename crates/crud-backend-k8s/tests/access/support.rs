// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory collaborators for driving `ResourceAccess` without a cluster.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crud_backend_k8s::{
	AccessCheck, AccessReviewer, ApiFamily, AuthorizationGate, CacheCapacities, ClientFactory,
	ClientRegistry, ControlPlane, DryRun, GateMode, Identity, K8sError, K8sResult, PatchStrategy,
	PropagationPolicy, RequestContext, ResourceAccess, ResourceRef, Selectors,
};
use serde_json::{json, Value};

/// One control-plane call as the cluster saw it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedCall {
	pub identity: Identity,
	pub verb: &'static str,
	pub path: String,
	pub name: Option<String>,
	pub selectors: Selectors,
	pub dry_run: DryRun,
	pub propagation: Option<PropagationPolicy>,
	pub patch: Option<PatchStrategy>,
	pub container: Option<String>,
}

/// A toy API server: objects keyed by collection path, every call recorded.
#[derive(Default)]
pub struct InMemoryCluster {
	objects: Mutex<HashMap<String, Vec<Value>>>,
	calls: Mutex<Vec<RecordedCall>>,
}

impl InMemoryCluster {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn seed(&self, collection: &ResourceRef, object: Value) {
		self
			.objects
			.lock()
			.unwrap()
			.entry(collection.collection_path())
			.or_default()
			.push(object);
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().unwrap().clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap().len()
	}

	pub fn last_call(&self) -> RecordedCall {
		self
			.calls
			.lock()
			.unwrap()
			.last()
			.cloned()
			.expect("no control-plane call recorded")
	}

	fn record(&self, call: RecordedCall) {
		self.calls.lock().unwrap().push(call);
	}

	fn stored(&self, path: &str) -> Vec<Value> {
		self
			.objects
			.lock()
			.unwrap()
			.get(path)
			.cloned()
			.unwrap_or_default()
	}
}

fn object_name(object: &Value) -> Option<&str> {
	object.pointer("/metadata/name").and_then(Value::as_str)
}

/// `a=b,c=d` against the object's labels.
fn matches_labels(object: &Value, selector: &str) -> bool {
	selector.split(',').filter(|s| !s.is_empty()).all(|pair| {
		let Some((key, value)) = pair.split_once('=') else {
			return false;
		};
		object
			.pointer("/metadata/labels")
			.and_then(|labels| labels.get(key))
			.and_then(Value::as_str)
			== Some(value)
	})
}

/// `involvedObject.kind=Notebook,...` as JSON pointers into the object.
fn matches_fields(object: &Value, selector: &str) -> bool {
	selector.split(',').filter(|s| !s.is_empty()).all(|pair| {
		let Some((path, value)) = pair.split_once('=') else {
			return false;
		};
		let pointer = format!("/{}", path.replace('.', "/"));
		object.pointer(&pointer).and_then(Value::as_str) == Some(value)
	})
}

fn merge(target: &mut Value, patch: &Value) {
	match (target, patch) {
		(Value::Object(target), Value::Object(patch)) => {
			for (key, value) in patch {
				if value.is_null() {
					target.remove(key);
				} else {
					merge(target.entry(key.clone()).or_insert(Value::Null), value);
				}
			}
		}
		(target, patch) => *target = patch.clone(),
	}
}

/// A [`ControlPlane`] bound to one identity over a shared [`InMemoryCluster`].
pub struct MemoryPlane {
	identity: Identity,
	cluster: Arc<InMemoryCluster>,
}

impl MemoryPlane {
	fn call(&self, verb: &'static str, target: &ResourceRef) -> RecordedCall {
		RecordedCall {
			identity: self.identity.clone(),
			verb,
			path: target.collection_path(),
			name: target.name.clone(),
			..Default::default()
		}
	}

	fn not_found(target: &ResourceRef) -> K8sError {
		K8sError::NotFound {
			kind: target.kind.kind.clone(),
			name: target.name.clone().unwrap_or_default(),
		}
	}
}

#[async_trait]
impl ControlPlane for MemoryPlane {
	fn identity(&self) -> &Identity {
		&self.identity
	}

	async fn get(&self, target: &ResourceRef) -> K8sResult<Value> {
		self.cluster.record(self.call("get", target));
		let name = target.require_name()?;
		self
			.cluster
			.stored(&target.collection_path())
			.into_iter()
			.find(|o| object_name(o) == Some(name))
			.ok_or_else(|| Self::not_found(target))
	}

	async fn list(&self, target: &ResourceRef, selectors: &Selectors) -> K8sResult<Value> {
		self.cluster.record(RecordedCall {
			selectors: selectors.clone(),
			..self.call("list", target)
		});
		let items: Vec<Value> = self
			.cluster
			.stored(&target.collection_path())
			.into_iter()
			.filter(|o| {
				selectors
					.label_selector
					.as_deref()
					.map_or(true, |s| matches_labels(o, s))
			})
			.filter(|o| {
				selectors
					.field_selector
					.as_deref()
					.map_or(true, |s| matches_fields(o, s))
			})
			.collect();
		Ok(json!({
			"apiVersion": target.kind.api_version(),
			"kind": format!("{}List", target.kind.kind),
			"metadata": { "resourceVersion": "1" },
			"items": items,
		}))
	}

	async fn create(
		&self,
		target: &ResourceRef,
		body: &Value,
		dry_run: DryRun,
	) -> K8sResult<Value> {
		self.cluster.record(RecordedCall {
			dry_run,
			..self.call("create", target)
		});
		let name = object_name(body).ok_or_else(|| K8sError::Api {
			code: 422,
			reason: "Invalid".to_string(),
			message: "metadata.name: Required value".to_string(),
		})?;

		let path = target.collection_path();
		let mut objects = self.cluster.objects.lock().unwrap();
		let collection = objects.entry(path).or_default();
		if collection.iter().any(|o| object_name(o) == Some(name)) {
			return Err(K8sError::Conflict {
				kind: target.kind.kind.clone(),
				name: name.to_string(),
			});
		}

		let mut admitted = body.clone();
		merge(
			&mut admitted,
			&json!({ "metadata": { "namespace": target.namespace, "uid": format!("uid-{name}") } }),
		);
		if dry_run == DryRun::Off {
			collection.push(admitted.clone());
		}
		Ok(admitted)
	}

	async fn delete(
		&self,
		target: &ResourceRef,
		propagation: PropagationPolicy,
	) -> K8sResult<Value> {
		self.cluster.record(RecordedCall {
			propagation: Some(propagation),
			..self.call("delete", target)
		});
		let name = target.require_name()?;
		let mut objects = self.cluster.objects.lock().unwrap();
		let collection = objects.entry(target.collection_path()).or_default();
		let before = collection.len();
		collection.retain(|o| object_name(o) != Some(name));
		if collection.len() == before {
			return Err(Self::not_found(target));
		}
		Ok(json!({ "kind": "Status", "status": "Success" }))
	}

	async fn patch(
		&self,
		target: &ResourceRef,
		body: &Value,
		strategy: PatchStrategy,
	) -> K8sResult<Value> {
		self.cluster.record(RecordedCall {
			patch: Some(strategy),
			..self.call("patch", target)
		});
		let name = target.require_name()?;
		let mut objects = self.cluster.objects.lock().unwrap();
		let object = objects
			.get_mut(&target.collection_path())
			.and_then(|c| c.iter_mut().find(|o| object_name(o) == Some(name)))
			.ok_or_else(|| Self::not_found(target))?;
		merge(object, body);
		Ok(object.clone())
	}

	async fn logs(&self, target: &ResourceRef, container: Option<&str>) -> K8sResult<String> {
		self.cluster.record(RecordedCall {
			container: container.map(str::to_string),
			..self.call("logs", target)
		});
		let name = target.require_name()?;
		Ok(format!("{name}/{}: ready\n", container.unwrap_or("main")))
	}
}

/// Counts builds and refuses identities containing `invalid`.
pub struct MemoryFactory {
	cluster: Arc<InMemoryCluster>,
	builds: AtomicUsize,
	built: Mutex<Vec<(ApiFamily, Identity)>>,
}

impl MemoryFactory {
	pub fn new(cluster: Arc<InMemoryCluster>) -> Arc<Self> {
		Arc::new(Self {
			cluster,
			builds: AtomicUsize::new(0),
			built: Mutex::new(Vec::new()),
		})
	}

	pub fn builds(&self) -> usize {
		self.builds.load(Ordering::SeqCst)
	}

	pub fn built(&self) -> Vec<(ApiFamily, Identity)> {
		self.built.lock().unwrap().clone()
	}
}

impl ClientFactory for MemoryFactory {
	fn build(&self, family: ApiFamily, identity: &Identity) -> K8sResult<Arc<dyn ControlPlane>> {
		if identity.as_str().contains("invalid") {
			return Err(K8sError::ClientConstruction {
				identity: identity.to_string(),
				message: "rejected by test factory".to_string(),
			});
		}
		self.builds.fetch_add(1, Ordering::SeqCst);
		self.built.lock().unwrap().push((family, identity.clone()));
		Ok(Arc::new(MemoryPlane {
			identity: identity.clone(),
			cluster: Arc::clone(&self.cluster),
		}))
	}
}

/// Answers from a fixed allow-list and records every question asked.
#[derive(Default)]
pub struct ScriptedReviewer {
	allowed: Mutex<Vec<(String, String, String)>>,
	unavailable: Mutex<bool>,
	asked: Mutex<Vec<(Identity, AccessCheck)>>,
}

impl ScriptedReviewer {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn allow(&self, identity: &str, verb: &str, resource: &str) {
		self
			.allowed
			.lock()
			.unwrap()
			.push((identity.to_string(), verb.to_string(), resource.to_string()));
	}

	pub fn go_down(&self) {
		*self.unavailable.lock().unwrap() = true;
	}

	pub fn asked(&self) -> Vec<(Identity, AccessCheck)> {
		self.asked.lock().unwrap().clone()
	}
}

#[async_trait]
impl AccessReviewer for ScriptedReviewer {
	async fn can_i(&self, identity: &Identity, check: &AccessCheck) -> K8sResult<bool> {
		self
			.asked
			.lock()
			.unwrap()
			.push((identity.clone(), check.clone()));
		if *self.unavailable.lock().unwrap() {
			return Err(K8sError::Transport {
				message: "authorization webhook unavailable".to_string(),
			});
		}
		let allowed = self.allowed.lock().unwrap();
		Ok(allowed.iter().any(|(who, verb, resource)| {
			who == identity.as_str() && verb == &check.verb && resource == &check.resource
		}))
	}
}

/// Everything a test needs, wired the way the binary wires production.
pub struct TestBackend {
	pub cluster: Arc<InMemoryCluster>,
	pub factory: Arc<MemoryFactory>,
	pub reviewer: Arc<ScriptedReviewer>,
	pub access: ResourceAccess,
}

impl TestBackend {
	pub fn new(mode: GateMode) -> Self {
		Self::build(mode, false, CacheCapacities::default())
	}

	pub fn with_capacities(capacities: CacheCapacities) -> Self {
		Self::build(GateMode::Selective, false, capacities)
	}

	pub fn auth_disabled(mode: GateMode) -> Self {
		Self::build(mode, true, CacheCapacities::default())
	}

	fn build(mode: GateMode, disable_auth: bool, capacities: CacheCapacities) -> Self {
		let cluster = InMemoryCluster::new();
		let factory = MemoryFactory::new(Arc::clone(&cluster));
		let reviewer = ScriptedReviewer::new();
		let registry = Arc::new(ClientRegistry::new(factory.clone(), capacities));
		let gate = Arc::new(
			AuthorizationGate::new(reviewer.clone(), mode).with_auth_disabled(disable_auth),
		);
		Self {
			cluster,
			factory,
			reviewer,
			access: ResourceAccess::new(registry, gate),
		}
	}
}

pub fn ctx(identity: &str) -> RequestContext {
	RequestContext::new(Identity::new(identity))
}

pub fn named(name: &str) -> Value {
	json!({ "metadata": { "name": name } })
}

pub fn item_names(list: &Value) -> Vec<String> {
	list["items"]
		.as_array()
		.map(|items| {
			items
				.iter()
				.filter_map(|o| object_name(o).map(str::to_string))
				.collect()
		})
		.unwrap_or_default()
}
