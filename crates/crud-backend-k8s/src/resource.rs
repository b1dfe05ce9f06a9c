// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Addressing for control-plane resources.
//!
//! Built-in and custom resources share one shape: a [`ResourceKind`]
//! (group/version/kind/plural) plus a [`ResourceRef`] that pins the namespace
//! and, for single-object verbs, the name.

use std::fmt;

use crate::error::{K8sError, K8sResult};

/// Group, version, kind and plural of a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKind {
	pub group: String,
	pub version: String,
	pub kind: String,
	pub plural: String,
	pub namespaced: bool,
}

impl ResourceKind {
	/// A namespaced resource in the given API group.
	pub fn namespaced(group: &str, version: &str, kind: &str, plural: &str) -> Self {
		Self {
			group: group.to_string(),
			version: version.to_string(),
			kind: kind.to_string(),
			plural: plural.to_string(),
			namespaced: true,
		}
	}

	/// A cluster-scoped resource in the given API group.
	pub fn cluster_scoped(group: &str, version: &str, kind: &str, plural: &str) -> Self {
		Self {
			namespaced: false,
			..Self::namespaced(group, version, kind, plural)
		}
	}

	pub fn namespaces() -> Self {
		Self::cluster_scoped("", "v1", "Namespace", "namespaces")
	}

	pub fn pods() -> Self {
		Self::namespaced("", "v1", "Pod", "pods")
	}

	pub fn persistent_volume_claims() -> Self {
		Self::namespaced("", "v1", "PersistentVolumeClaim", "persistentvolumeclaims")
	}

	pub fn secrets() -> Self {
		Self::namespaced("", "v1", "Secret", "secrets")
	}

	pub fn events() -> Self {
		Self::namespaced("", "v1", "Event", "events")
	}

	pub fn storage_classes() -> Self {
		Self::cluster_scoped("storage.k8s.io", "v1", "StorageClass", "storageclasses")
	}

	pub fn notebooks() -> Self {
		Self::namespaced("kubeflow.org", "v1beta1", "Notebook", "notebooks")
	}

	pub fn pod_defaults() -> Self {
		Self::namespaced("kubeflow.org", "v1alpha1", "PodDefault", "poddefaults")
	}

	/// The `apiVersion` string, e.g. `v1` or `kubeflow.org/v1beta1`.
	pub fn api_version(&self) -> String {
		if self.group.is_empty() {
			self.version.clone()
		} else {
			format!("{}/{}", self.group, self.version)
		}
	}

	fn url_prefix(&self) -> String {
		if self.group.is_empty() {
			format!("/api/{}", self.version)
		} else {
			format!("/apis/{}/{}", self.group, self.version)
		}
	}
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.group.is_empty() {
			write!(f, "{}", self.plural)
		} else {
			write!(f, "{}.{}", self.plural, self.group)
		}
	}
}

/// A concrete address on the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
	pub kind: ResourceKind,
	pub namespace: Option<String>,
	pub name: Option<String>,
}

impl ResourceRef {
	/// Address a namespaced collection. The namespace is mandatory; an empty
	/// namespace is rejected rather than widened to all namespaces.
	pub fn namespaced(kind: ResourceKind, namespace: &str) -> K8sResult<Self> {
		if !kind.namespaced {
			return Err(K8sError::InvalidRequest {
				message: format!("{kind} is cluster-scoped and takes no namespace"),
			});
		}
		if namespace.is_empty() {
			return Err(K8sError::InvalidRequest {
				message: format!("namespace is required for {kind}"),
			});
		}
		validate_namespace(namespace)?;
		Ok(Self {
			kind,
			namespace: Some(namespace.to_string()),
			name: None,
		})
	}

	/// Address a cluster-scoped collection.
	pub fn cluster(kind: ResourceKind) -> K8sResult<Self> {
		if kind.namespaced {
			return Err(K8sError::InvalidRequest {
				message: format!("namespace is required for {kind}"),
			});
		}
		Ok(Self {
			kind,
			namespace: None,
			name: None,
		})
	}

	/// Address a collection of a kind whose scope is only known at runtime.
	pub fn scoped(kind: ResourceKind, namespace: Option<&str>) -> K8sResult<Self> {
		match (kind.namespaced, namespace) {
			(true, ns) => Self::namespaced(kind, ns.unwrap_or_default()),
			(false, None) => Self::cluster(kind),
			(false, Some(_)) => Err(K8sError::InvalidRequest {
				message: format!("{kind} is cluster-scoped and takes no namespace"),
			}),
		}
	}

	/// Narrow the reference to a single named object.
	pub fn named(mut self, name: &str) -> K8sResult<Self> {
		if name.is_empty() {
			return Err(K8sError::InvalidRequest {
				message: format!("name is required to address a single {}", self.kind.kind),
			});
		}
		validate_name(&self.kind, name)?;
		self.name = Some(name.to_string());
		Ok(self)
	}

	pub fn require_name(&self) -> K8sResult<&str> {
		self.name.as_deref().ok_or_else(|| K8sError::InvalidRequest {
			message: format!("name is required to address a single {}", self.kind.kind),
		})
	}

	/// Collection path understood by the API server, without the object name.
	pub fn collection_path(&self) -> String {
		match &self.namespace {
			Some(ns) => format!(
				"{}/namespaces/{}/{}",
				self.kind.url_prefix(),
				ns,
				self.kind.plural
			),
			None => format!("{}/{}", self.kind.url_prefix(), self.kind.plural),
		}
	}
}

const MAX_NAMESPACE_LEN: usize = 63;

/// Namespaces are DNS-1123 labels.
fn validate_namespace(namespace: &str) -> K8sResult<()> {
	let bytes = namespace.as_bytes();
	let label_char = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-';
	let valid = bytes.len() <= MAX_NAMESPACE_LEN
		&& bytes.iter().all(label_char)
		&& bytes.first().is_some_and(|b| *b != b'-')
		&& bytes.last().is_some_and(|b| *b != b'-');
	if valid {
		Ok(())
	} else {
		Err(K8sError::InvalidRequest {
			message: format!(
				"invalid namespace '{}': must be a DNS-1123 label",
				namespace.escape_debug()
			),
		})
	}
}

/// Object names land in the URL path and in event field selectors, so
/// anything that would change either is rejected.
fn validate_name(kind: &ResourceKind, name: &str) -> K8sResult<()> {
	let unsafe_char = |c: char| {
		matches!(c, '/' | '%' | '?' | '#' | ',' | '=' | '\\') || c.is_whitespace() || c.is_control()
	};
	if name == "." || name == ".." || name.contains(unsafe_char) {
		return Err(K8sError::InvalidRequest {
			message: format!("invalid {} name '{}'", kind.kind, name.escape_debug()),
		});
	}
	Ok(())
}

impl fmt::Display for ResourceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.kind)?;
		if let Some(ns) = &self.namespace {
			write!(f, " in {ns}")?;
		}
		if let Some(name) = &self.name {
			write!(f, " ({name})")?;
		}
		Ok(())
	}
}

/// Server-side filters for list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selectors {
	pub label_selector: Option<String>,
	pub field_selector: Option<String>,
}

impl Selectors {
	pub fn labels(selector: impl Into<String>) -> Self {
		Self {
			label_selector: Some(selector.into()),
			field_selector: None,
		}
	}

	pub fn fields(selector: impl Into<String>) -> Self {
		Self {
			label_selector: None,
			field_selector: Some(selector.into()),
		}
	}

	/// Field selector matching events whose involved object is `kind`/`name`.
	pub fn involved_object(kind: &str, name: &str) -> Self {
		Self::fields(format!(
			"involvedObject.kind={kind},involvedObject.name={name}"
		))
	}
}

/// How dependents of a deleted object are cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropagationPolicy {
	/// Dependents are deleted before the owner is considered deleted.
	#[default]
	Foreground,
	Background,
	Orphan,
}

impl PropagationPolicy {
	pub fn as_str(&self) -> &'static str {
		match self {
			PropagationPolicy::Foreground => "Foreground",
			PropagationPolicy::Background => "Background",
			PropagationPolicy::Orphan => "Orphan",
		}
	}
}

/// Patch encodings accepted by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStrategy {
	/// `application/merge-patch+json`
	Merge,
	/// `application/strategic-merge-patch+json`, built-in kinds only.
	StrategicMerge,
}

/// Whether a create is persisted or only validated and admitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DryRun {
	#[default]
	Off,
	All,
}

impl From<bool> for DryRun {
	fn from(value: bool) -> Self {
		if value {
			DryRun::All
		} else {
			DryRun::Off
		}
	}
}
