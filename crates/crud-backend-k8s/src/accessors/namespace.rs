// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde_json::Value;

use super::{Gating, ResourceAccess};
use crate::authz::AccessCheck;
use crate::error::K8sResult;
use crate::factory::ApiFamily;
use crate::identity::{Attribution, RequestContext};
use crate::resource::{ResourceKind, ResourceRef, Selectors};

impl ResourceAccess {
	/// List all namespaces. Always gated: the caller must be allowed to list
	/// namespaces cluster-wide, whichever identity then issues the call.
	pub async fn list_namespaces(
		&self,
		ctx: &RequestContext,
		attribution: Attribution,
	) -> K8sResult<Value> {
		let target = ResourceRef::cluster(ResourceKind::namespaces())?;
		let check = AccessCheck::for_target("list", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				attribution,
				Gating::Always,
				check,
				|client| async move { client.list(&target, &Selectors::default()).await },
			)
			.await
	}
}
