// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Accessors for arbitrary custom resources, addressed by [`ResourceKind`].
//!
//! `namespace` must be `Some` exactly when the kind is namespaced.

use serde_json::Value;

use super::{Gating, ResourceAccess};
use crate::authz::AccessCheck;
use crate::error::K8sResult;
use crate::factory::ApiFamily;
use crate::identity::{Attribution, RequestContext};
use crate::resource::{
	DryRun, PatchStrategy, PropagationPolicy, ResourceKind, ResourceRef, Selectors,
};

impl ResourceAccess {
	pub async fn create_custom_resource(
		&self,
		ctx: &RequestContext,
		kind: &ResourceKind,
		namespace: Option<&str>,
		body: &Value,
	) -> K8sResult<Value> {
		let target = ResourceRef::scoped(kind.clone(), namespace)?;
		let check = AccessCheck::for_target("create", &target);
		self
			.call(
				ctx,
				ApiFamily::CustomObjects,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.create(&target, body, DryRun::Off).await },
			)
			.await
	}

	pub async fn get_custom_resource(
		&self,
		ctx: &RequestContext,
		kind: &ResourceKind,
		namespace: Option<&str>,
		name: &str,
	) -> K8sResult<Value> {
		let target = ResourceRef::scoped(kind.clone(), namespace)?.named(name)?;
		let check = AccessCheck::for_target("get", &target);
		self
			.call(
				ctx,
				ApiFamily::CustomObjects,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.get(&target).await },
			)
			.await
	}

	pub async fn list_custom_resources(
		&self,
		ctx: &RequestContext,
		kind: &ResourceKind,
		namespace: Option<&str>,
	) -> K8sResult<Value> {
		let target = ResourceRef::scoped(kind.clone(), namespace)?;
		let check = AccessCheck::for_target("list", &target);
		self
			.call(
				ctx,
				ApiFamily::CustomObjects,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.list(&target, &Selectors::default()).await },
			)
			.await
	}

	/// Delete with `propagation`, foreground when `None`.
	pub async fn delete_custom_resource(
		&self,
		ctx: &RequestContext,
		kind: &ResourceKind,
		namespace: Option<&str>,
		name: &str,
		propagation: Option<PropagationPolicy>,
	) -> K8sResult<Value> {
		let target = ResourceRef::scoped(kind.clone(), namespace)?.named(name)?;
		let propagation = propagation.unwrap_or_default();
		let check = AccessCheck::for_target("delete", &target);
		self
			.call(
				ctx,
				ApiFamily::CustomObjects,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.delete(&target, propagation).await },
			)
			.await
	}

	pub async fn patch_custom_resource(
		&self,
		ctx: &RequestContext,
		kind: &ResourceKind,
		namespace: Option<&str>,
		name: &str,
		body: &Value,
	) -> K8sResult<Value> {
		let target = ResourceRef::scoped(kind.clone(), namespace)?.named(name)?;
		let check = AccessCheck::for_target("patch", &target);
		self
			.call(
				ctx,
				ApiFamily::CustomObjects,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.patch(&target, body, PatchStrategy::Merge).await },
			)
			.await
	}
}
