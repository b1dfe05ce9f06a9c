// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Resource accessors.
//!
//! Every accessor runs the same sequence for the caller in its
//! [`RequestContext`]:
//!
//! 1. bail out if the request is already cancelled;
//! 2. pass the authorization gate (always for policy-sensitive operations,
//!    otherwise only in [`GateMode::Strict`](crate::authz::GateMode));
//! 3. take a client for the attributed identity from the family cache;
//! 4. bail out again if the request was cancelled meanwhile;
//! 5. issue exactly one control-plane call and return its payload unchanged.

mod custom_resource;
mod namespace;
mod notebook;
mod pod;
mod poddefault;
mod pvc;
mod secret;
mod storage_class;

use std::future::Future;
use std::sync::Arc;

use crate::authz::{AccessCheck, AuthorizationGate};
use crate::cache::ClientRegistry;
use crate::control_plane::ControlPlane;
use crate::error::K8sResult;
use crate::factory::ApiFamily;
use crate::identity::{Attribution, RequestContext};
use crate::resource::ResourceKind;

pub use storage_class::{
	default_storage_class, BETA_DEFAULT_CLASS_ANNOTATION, DEFAULT_CLASS_ANNOTATION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gating {
	/// Policy-sensitive: checked in every gate mode.
	Always,
	/// Checked only when the gate is strict.
	StrictOnly,
}

/// Entry point for all resource accessors.
///
/// Cheap to clone; the caches and the gate are shared.
#[derive(Debug, Clone)]
pub struct ResourceAccess {
	registry: Arc<ClientRegistry>,
	gate: Arc<AuthorizationGate>,
}

impl ResourceAccess {
	pub fn new(registry: Arc<ClientRegistry>, gate: Arc<AuthorizationGate>) -> Self {
		Self { registry, gate }
	}

	pub fn registry(&self) -> &ClientRegistry {
		&self.registry
	}

	pub fn gate(&self) -> &AuthorizationGate {
		&self.gate
	}

	/// Ask the decision service whether the caller may perform `verb` on `kind`.
	pub async fn can_i(
		&self,
		ctx: &RequestContext,
		verb: &str,
		kind: &ResourceKind,
		namespace: Option<&str>,
	) -> K8sResult<bool> {
		ctx.ensure_active()?;
		self
			.gate
			.can_i(ctx.identity(), &AccessCheck::new(verb, kind, namespace))
			.await
	}

	async fn call<T, F, Fut>(
		&self,
		ctx: &RequestContext,
		family: ApiFamily,
		attribution: Attribution,
		gating: Gating,
		check: AccessCheck,
		op: F,
	) -> K8sResult<T>
	where
		F: FnOnce(Arc<dyn ControlPlane>) -> Fut,
		Fut: Future<Output = K8sResult<T>>,
	{
		ctx.ensure_active()?;

		// The gate always judges the caller, even for service-attributed calls.
		match gating {
			Gating::Always => self.gate.authorize(ctx.identity(), &check).await?,
			Gating::StrictOnly => self.gate.authorize_if_strict(ctx.identity(), &check).await?,
		}

		let identity = ctx.identity_for(attribution);
		let client = self.registry.client(family, &identity)?;

		ctx.ensure_active()?;
		op(client).await
	}
}
