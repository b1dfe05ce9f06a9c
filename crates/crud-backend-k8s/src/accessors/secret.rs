// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde_json::Value;

use super::{Gating, ResourceAccess};
use crate::authz::AccessCheck;
use crate::error::K8sResult;
use crate::factory::ApiFamily;
use crate::identity::{Attribution, RequestContext};
use crate::resource::{DryRun, ResourceKind, ResourceRef};

impl ResourceAccess {
	pub async fn get_secret(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		name: &str,
		attribution: Attribution,
	) -> K8sResult<Value> {
		let target = ResourceRef::namespaced(ResourceKind::secrets(), namespace)?.named(name)?;
		let check = AccessCheck::for_target("get", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				attribution,
				Gating::StrictOnly,
				check,
				|client| async move { client.get(&target).await },
			)
			.await
	}

	pub async fn create_secret(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		body: &Value,
		attribution: Attribution,
	) -> K8sResult<Value> {
		let target = ResourceRef::namespaced(ResourceKind::secrets(), namespace)?;
		let check = AccessCheck::for_target("create", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				attribution,
				Gating::StrictOnly,
				check,
				|client| async move { client.create(&target, body, DryRun::Off).await },
			)
			.await
	}
}
