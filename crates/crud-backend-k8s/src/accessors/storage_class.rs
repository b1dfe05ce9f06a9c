// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde_json::Value;
use tracing::debug;

use super::{Gating, ResourceAccess};
use crate::authz::AccessCheck;
use crate::error::K8sResult;
use crate::factory::ApiFamily;
use crate::identity::{Attribution, RequestContext};
use crate::resource::{ResourceKind, ResourceRef, Selectors};

pub const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";
pub const BETA_DEFAULT_CLASS_ANNOTATION: &str = "storageclass.beta.kubernetes.io/is-default-class";

fn is_default_class(class: &Value) -> bool {
	let Some(annotations) = class.pointer("/metadata/annotations") else {
		return false;
	};
	[DEFAULT_CLASS_ANNOTATION, BETA_DEFAULT_CLASS_ANNOTATION]
		.iter()
		.any(|key| annotations.get(*key).and_then(Value::as_str) == Some("true"))
}

/// First storage class in a list response marked as the cluster default.
pub fn default_storage_class(list: &Value) -> Option<Value> {
	list
		.get("items")?
		.as_array()?
		.iter()
		.find(|class| is_default_class(class))
		.cloned()
}

impl ResourceAccess {
	pub async fn list_storage_classes(&self, ctx: &RequestContext) -> K8sResult<Value> {
		let target = ResourceRef::cluster(ResourceKind::storage_classes())?;
		let check = AccessCheck::for_target("list", &target);
		self
			.call(
				ctx,
				ApiFamily::Storage,
				Attribution::Caller,
				Gating::StrictOnly,
				check,
				|client| async move { client.list(&target, &Selectors::default()).await },
			)
			.await
	}

	/// The default storage class, or `None` if no class is marked default.
	pub async fn get_default_storage_class(
		&self,
		ctx: &RequestContext,
	) -> K8sResult<Option<Value>> {
		let classes = self.list_storage_classes(ctx).await?;
		let default = default_storage_class(&classes);
		if default.is_none() {
			debug!("no default storage class");
		}
		Ok(default)
	}
}
