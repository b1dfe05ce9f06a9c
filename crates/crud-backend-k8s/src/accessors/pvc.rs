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

fn pvcs(namespace: &str) -> K8sResult<ResourceRef> {
	ResourceRef::namespaced(ResourceKind::persistent_volume_claims(), namespace)
}

impl ResourceAccess {
	/// Create a PVC. With [`DryRun::All`] the control plane only validates and
	/// admits it; its answer is returned either way.
	pub async fn create_pvc(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		body: &Value,
		dry_run: DryRun,
	) -> K8sResult<Value> {
		let target = pvcs(namespace)?;
		let check = AccessCheck::for_target("create", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.create(&target, body, dry_run).await },
			)
			.await
	}

	pub async fn get_pvc(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
	) -> K8sResult<Value> {
		let target = pvcs(namespace)?.named(name)?;
		let check = AccessCheck::for_target("get", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.get(&target).await },
			)
			.await
	}

	pub async fn list_pvcs(&self, ctx: &RequestContext, namespace: &str) -> K8sResult<Value> {
		let target = pvcs(namespace)?;
		let check = AccessCheck::for_target("list", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.list(&target, &Selectors::default()).await },
			)
			.await
	}

	/// Delete a PVC with foreground propagation.
	pub async fn delete_pvc(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
	) -> K8sResult<Value> {
		let target = pvcs(namespace)?.named(name)?;
		let check = AccessCheck::for_target("delete", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.delete(&target, PropagationPolicy::Foreground).await },
			)
			.await
	}

	/// Strategic-merge patch of a PVC. The caller picks who the patch is
	/// attributed to; [`Attribution::Service`] is for system-initiated updates.
	pub async fn patch_pvc(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
		body: &Value,
		attribution: Attribution,
	) -> K8sResult<Value> {
		let target = pvcs(namespace)?.named(name)?;
		let check = AccessCheck::for_target("patch", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				attribution,
				Gating::StrictOnly,
				check,
				|client| async move {
					client.patch(&target, body, PatchStrategy::StrategicMerge).await
				},
			)
			.await
	}

	/// Events whose involved object is the PVC `name`, filtered by the control plane.
	pub async fn list_pvc_events(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
	) -> K8sResult<Value> {
		let pvc = pvcs(namespace)?.named(name)?;
		let target = ResourceRef::namespaced(ResourceKind::events(), namespace)?;
		let selectors = Selectors::involved_object(&pvc.kind.kind, pvc.require_name()?);
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
