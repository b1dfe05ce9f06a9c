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
	pub async fn list_poddefaults(
		&self,
		ctx: &RequestContext,
		namespace: &str,
	) -> K8sResult<Value> {
		let target = ResourceRef::namespaced(ResourceKind::pod_defaults(), namespace)?;
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
}
