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
	pub async fn list_pods(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		label_selector: Option<&str>,
		attribution: Attribution,
	) -> K8sResult<Value> {
		let target = ResourceRef::namespaced(ResourceKind::pods(), namespace)?;
		let selectors = Selectors {
			label_selector: label_selector.map(str::to_string),
			field_selector: None,
		};
		let check = AccessCheck::for_target("list", &target);
		self
			.call(
				ctx,
				ApiFamily::Core,
				attribution,
				Gating::StrictOnly,
				check,
				|client| async move { client.list(&target, &selectors).await },
			)
			.await
	}

	/// Plain-text logs of `pod`, of `container` when the pod has several.
	pub async fn get_pod_logs(
		&self,
		ctx: &RequestContext,
		namespace: &str,
		pod: &str,
		container: Option<&str>,
		attribution: Attribution,
	) -> K8sResult<String> {
		let target = ResourceRef::namespaced(ResourceKind::pods(), namespace)?.named(pod)?;
		let check = AccessCheck::for_target("get", &target).with_subresource("log");
		self
			.call(
				ctx,
				ApiFamily::Core,
				attribution,
				Gating::StrictOnly,
				check,
				|client| async move { client.logs(&target, container).await },
			)
			.await
	}
}
