// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde_json::Value;

use super::{Gating, ResourceAccess};
use crate::authz::AccessCheck;
use crate::error::K8sResult;
use crate::factory::ApiFamily;
use crate::identity::{Attribution, RequestContext};
use crate::resource::{
	DryRun, PatchStrategy, PropagationPolicy, ResourceKind, ResourceRef, Selectors,
};

fn notebooks(namespace: &str) -> K8sResult<ResourceRef> {
	ResourceRef::namespaced(ResourceKind::notebooks(), namespace)
}

impl ResourceAccess {
	pub async fn get_notebook(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
	) -> K8sResult<Value> {
		let target = notebooks(namespace)?.named(name)?;
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

	pub async fn create_notebook(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		body: &Value,
		dry_run: DryRun,
	) -> K8sResult<Value> {
		let target = notebooks(namespace)?;
		let check = AccessCheck::for_target("create", &target);
		self
			.call(
				ctx,
				ApiFamily::CustomObjects,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.create(&target, body, dry_run).await },
			)
			.await
	}

	pub async fn list_notebooks(&self, ctx: &RequestContext, namespace: &str) -> K8sResult<Value> {
		let target = notebooks(namespace)?;
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

	/// Delete a notebook with foreground propagation, so its stateful set and
	/// pods are gone before the notebook is.
	pub async fn delete_notebook(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
	) -> K8sResult<Value> {
		let target = notebooks(namespace)?.named(name)?;
		let check = AccessCheck::for_target("delete", &target);
		self
			.call(
				ctx,
				ApiFamily::CustomObjects,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.delete(&target, PropagationPolicy::Foreground).await },
			)
			.await
	}

	/// JSON merge patch; custom resources do not support strategic merge.
	pub async fn patch_notebook(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
		body: &Value,
	) -> K8sResult<Value> {
		let target = notebooks(namespace)?.named(name)?;
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

	pub async fn list_notebook_events(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
	) -> K8sResult<Value> {
		let notebook = notebooks(namespace)?.named(name)?;
		let target = ResourceRef::namespaced(ResourceKind::events(), namespace)?;
		let selectors = Selectors::involved_object(&notebook.kind.kind, notebook.require_name()?);
		let check = AccessCheck::for_target("list", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.list(&target, &selectors).await },
			)
			.await
	}
}
