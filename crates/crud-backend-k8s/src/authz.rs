// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Authorization gate backed by the cluster's access-control subsystem.
//!
//! The gate never encodes policy itself. It asks an [`AccessReviewer`]
//! whether an identity may perform a verb on a resource, and turns the answer
//! into an [`AuthzDecision`]. Decisions are not cached.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::authorization::v1::{
	ResourceAttributes, SubjectAccessReview, SubjectAccessReviewSpec,
};
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::{debug, instrument, warn};

use crate::error::{K8sError, K8sResult};
use crate::identity::Identity;
use crate::resource::{ResourceKind, ResourceRef};

/// One question for the access-control subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCheck {
	pub verb: String,
	/// API group; empty for the core group.
	pub group: String,
	pub version: String,
	/// Plural resource name, e.g. `pods`.
	pub resource: String,
	pub subresource: Option<String>,
	/// `None` for cluster-scoped checks.
	pub namespace: Option<String>,
	pub name: Option<String>,
}

impl AccessCheck {
	pub fn new(verb: &str, kind: &ResourceKind, namespace: Option<&str>) -> Self {
		Self {
			verb: verb.to_string(),
			group: kind.group.clone(),
			version: kind.version.clone(),
			resource: kind.plural.clone(),
			subresource: None,
			namespace: namespace.map(str::to_string),
			name: None,
		}
	}

	/// Check for `verb` on exactly the object or collection `target` addresses.
	pub fn for_target(verb: &str, target: &ResourceRef) -> Self {
		Self {
			name: target.name.clone(),
			..Self::new(verb, &target.kind, target.namespace.as_deref())
		}
	}

	pub fn with_subresource(mut self, subresource: &str) -> Self {
		self.subresource = Some(subresource.to_string());
		self
	}

	fn resource_label(&self) -> String {
		let mut label = if self.group.is_empty() {
			self.resource.clone()
		} else {
			format!("{}.{}", self.resource, self.group)
		};
		if let Some(sub) = &self.subresource {
			label.push('/');
			label.push_str(sub);
		}
		label
	}
}

impl fmt::Display for AccessCheck {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.verb, self.resource_label())?;
		if let Some(ns) = &self.namespace {
			write!(f, " in {ns}")?;
		}
		Ok(())
	}
}

/// The access-control decision service.
#[async_trait]
pub trait AccessReviewer: Send + Sync {
	/// May `identity` perform `check`?
	async fn can_i(&self, identity: &Identity, check: &AccessCheck) -> K8sResult<bool>;
}

/// Posts a `SubjectAccessReview` with the service's ambient client.
#[derive(Clone)]
pub struct SubjectAccessReviewer {
	client: Client,
}

impl SubjectAccessReviewer {
	/// `client` must be the ambient (non-impersonating) client: creating
	/// reviews is a privilege of the service, not of the reviewed user.
	pub fn new(client: Client) -> Self {
		Self { client }
	}
}

impl fmt::Debug for SubjectAccessReviewer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SubjectAccessReviewer").finish_non_exhaustive()
	}
}

pub(crate) fn subject_access_review(
	identity: &Identity,
	check: &AccessCheck,
) -> SubjectAccessReview {
	SubjectAccessReview {
		spec: SubjectAccessReviewSpec {
			user: Some(identity.as_str().to_string()),
			resource_attributes: Some(ResourceAttributes {
				verb: Some(check.verb.clone()),
				group: Some(check.group.clone()),
				version: Some(check.version.clone()),
				resource: Some(check.resource.clone()),
				subresource: check.subresource.clone(),
				namespace: check.namespace.clone(),
				name: check.name.clone(),
				..Default::default()
			}),
			..Default::default()
		},
		..Default::default()
	}
}

#[async_trait]
impl AccessReviewer for SubjectAccessReviewer {
	#[instrument(skip_all, fields(identity = %identity, check = %check))]
	async fn can_i(&self, identity: &Identity, check: &AccessCheck) -> K8sResult<bool> {
		let reviews: Api<SubjectAccessReview> = Api::all(self.client.clone());
		let response = reviews
			.create(&PostParams::default(), &subject_access_review(identity, check))
			.await?;

		let allowed = response.status.map(|s| s.allowed).unwrap_or(false);
		debug!(allowed, "subject access review answered");
		Ok(allowed)
	}
}

/// Which accessors pass through the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateMode {
	/// Only policy-sensitive operations (listing namespaces).
	#[default]
	Selective,
	/// Every accessor, each with its own verb and resource.
	Strict,
}

impl fmt::Display for GateMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GateMode::Selective => f.write_str("selective"),
			GateMode::Strict => f.write_str("strict"),
		}
	}
}

impl FromStr for GateMode {
	type Err = K8sError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"selective" => Ok(GateMode::Selective),
			"strict" => Ok(GateMode::Strict),
			other => Err(K8sError::Configuration {
				message: format!("unknown gate mode '{other}', expected selective or strict"),
			}),
		}
	}
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzDecision {
	Allow,
	Deny { reason: String },
}

impl AuthzDecision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, AuthzDecision::Allow)
	}

	/// Turn a deny into [`K8sError::Forbidden`].
	pub fn into_result(self, identity: &Identity, check: &AccessCheck) -> K8sResult<()> {
		match self {
			AuthzDecision::Allow => Ok(()),
			AuthzDecision::Deny { reason } => Err(K8sError::Forbidden {
				identity: identity.to_string(),
				verb: check.verb.clone(),
				resource: check.resource_label(),
				namespace: check.namespace.clone(),
				reason,
			}),
		}
	}
}

const NO_USER_IDENTITY: &str = "no user identity on the request";

/// Evaluates [`AccessCheck`]s for callers before control-plane calls.
pub struct AuthorizationGate {
	reviewer: Arc<dyn AccessReviewer>,
	mode: GateMode,
	disable_auth: bool,
}

impl AuthorizationGate {
	pub fn new(reviewer: Arc<dyn AccessReviewer>, mode: GateMode) -> Self {
		Self {
			reviewer,
			mode,
			disable_auth: false,
		}
	}

	/// With authentication disabled every check is allowed.
	pub fn with_auth_disabled(mut self, disable_auth: bool) -> Self {
		if disable_auth {
			warn!("authorization checks are disabled; every request is allowed");
		}
		self.disable_auth = disable_auth;
		self
	}

	pub fn mode(&self) -> GateMode {
		self.mode
	}

	pub fn auth_disabled(&self) -> bool {
		self.disable_auth
	}

	/// Ask the decision service directly. Reviewer failures are returned as
	/// errors rather than turned into a deny, and so is a request with no user
	/// identity while auth is enabled.
	pub async fn can_i(&self, identity: &Identity, check: &AccessCheck) -> K8sResult<bool> {
		if self.disable_auth {
			debug!(%identity, %check, "auth disabled, allowing");
			return Ok(true);
		}
		if identity.is_ambient() {
			return Err(K8sError::Unauthenticated {
				message: NO_USER_IDENTITY.to_string(),
			});
		}
		self.reviewer.can_i(identity, check).await
	}

	/// Evaluate `check` for `identity`. Never errors: a reviewer failure is a deny.
	pub async fn decide(&self, identity: &Identity, check: &AccessCheck) -> AuthzDecision {
		if !self.disable_auth && identity.is_ambient() {
			return AuthzDecision::Deny {
				reason: NO_USER_IDENTITY.to_string(),
			};
		}

		match self.can_i(identity, check).await {
			Ok(true) => AuthzDecision::Allow,
			Ok(false) => AuthzDecision::Deny {
				reason: "denied by access review".to_string(),
			},
			Err(e) => AuthzDecision::Deny {
				reason: format!("access review failed: {e}"),
			},
		}
	}

	/// Gate a policy-sensitive operation. Denies surface as [`K8sError::Forbidden`].
	pub async fn authorize(&self, identity: &Identity, check: &AccessCheck) -> K8sResult<()> {
		let decision = self.decide(identity, check).await;
		if let AuthzDecision::Deny { reason } = &decision {
			warn!(%identity, %check, %reason, "authorization denied");
		}
		decision.into_result(identity, check)
	}

	/// Gate an ordinary operation: a no-op unless the gate is in strict mode.
	pub async fn authorize_if_strict(
		&self,
		identity: &Identity,
		check: &AccessCheck,
	) -> K8sResult<()> {
		match self.mode {
			GateMode::Selective => Ok(()),
			GateMode::Strict => self.authorize(identity, check).await,
		}
	}
}

impl fmt::Debug for AuthorizationGate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthorizationGate")
			.field("mode", &self.mode)
			.field("disable_auth", &self.disable_auth)
			.finish_non_exhaustive()
	}
}
