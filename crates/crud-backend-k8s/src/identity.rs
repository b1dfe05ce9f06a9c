// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Caller identities and the per-request context that carries them.
//!
//! An [`Identity`] is an opaque pass-through token: it is compared and hashed
//! but never parsed, merged or rewritten. The empty identity means "act as the
//! service itself" and is what [`Identity::ambient`] returns.

use std::fmt;

use http::{HeaderMap, HeaderName};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{K8sError, K8sResult};

/// Opaque caller identifier used as the impersonation target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// The service's own identity (no impersonation).
	pub fn ambient() -> Self {
		Self(String::new())
	}

	pub fn is_ambient(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_ambient() {
			f.write_str("<ambient>")
		} else {
			f.write_str(&self.0)
		}
	}
}

impl From<&str> for Identity {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for Identity {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// Who an outbound control-plane call is attributed to.
///
/// No `Default`: every call site names one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
	/// Impersonate the identity of the current request.
	Caller,
	/// Use the service's ambient identity. Reserved for system-initiated calls.
	Service,
}

/// Supplies the identity of the current caller for one request.
pub trait IdentitySource {
	fn current_identity(&self) -> K8sResult<Identity>;
}

/// An identity source that always returns the same identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Identity);

impl IdentitySource for StaticIdentity {
	fn current_identity(&self) -> K8sResult<Identity> {
		Ok(self.0.clone())
	}
}

/// Resolves identities from a trusted request header set by an
/// authenticating proxy in front of the backend.
#[derive(Debug, Clone)]
pub struct HeaderIdentitySource {
	header: HeaderName,
	prefix: String,
	disable_auth: bool,
}

impl HeaderIdentitySource {
	pub fn new(header: &str, prefix: impl Into<String>, disable_auth: bool) -> K8sResult<Self> {
		let header = HeaderName::from_bytes(header.as_bytes()).map_err(|e| K8sError::Configuration {
			message: format!("invalid user id header '{header}': {e}"),
		})?;
		if disable_auth {
			warn!("authentication is disabled; requests will run as the service identity");
		}
		Ok(Self {
			header,
			prefix: prefix.into(),
			disable_auth,
		})
	}

	pub fn header(&self) -> &HeaderName {
		&self.header
	}

	/// Bind the source to the headers of one request.
	pub fn for_headers<'a>(&'a self, headers: &'a HeaderMap) -> HeaderIdentity<'a> {
		HeaderIdentity {
			source: self,
			headers,
		}
	}

	fn resolve(&self, headers: &HeaderMap) -> K8sResult<Identity> {
		if self.disable_auth {
			return Ok(Identity::ambient());
		}

		let value = headers
			.get(&self.header)
			.ok_or_else(|| K8sError::Unauthenticated {
				message: format!("no user credentials found in header '{}'", self.header),
			})?;
		let value = value.to_str().map_err(|_| K8sError::Unauthenticated {
			message: format!("header '{}' is not valid UTF-8", self.header),
		})?;

		let user = value.strip_prefix(self.prefix.as_str()).unwrap_or(value).trim();
		if user.is_empty() {
			return Err(K8sError::Unauthenticated {
				message: format!("header '{}' carries an empty user", self.header),
			});
		}
		Ok(Identity::new(user))
	}
}

/// A [`HeaderIdentitySource`] bound to one request's headers.
pub struct HeaderIdentity<'a> {
	source: &'a HeaderIdentitySource,
	headers: &'a HeaderMap,
}

impl IdentitySource for HeaderIdentity<'_> {
	fn current_identity(&self) -> K8sResult<Identity> {
		self.source.resolve(self.headers)
	}
}

/// Per-request state handed to every accessor.
#[derive(Debug, Clone)]
pub struct RequestContext {
	identity: Identity,
	cancellation: CancellationToken,
}

impl RequestContext {
	pub fn new(identity: Identity) -> Self {
		Self {
			identity,
			cancellation: CancellationToken::new(),
		}
	}

	/// Resolve the caller once and build a context around it.
	pub fn from_source(source: &dyn IdentitySource) -> K8sResult<Self> {
		Ok(Self::new(source.current_identity()?))
	}

	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = token;
		self
	}

	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	pub fn cancellation(&self) -> &CancellationToken {
		&self.cancellation
	}

	/// Identity a call should run as under the given attribution.
	pub fn identity_for(&self, attribution: Attribution) -> Identity {
		match attribution {
			Attribution::Caller => self.identity.clone(),
			Attribution::Service => Identity::ambient(),
		}
	}

	/// Fails once the request has been cancelled. Checked before each network call.
	pub fn ensure_active(&self) -> K8sResult<()> {
		if self.cancellation.is_cancelled() {
			Err(K8sError::Cancelled)
		} else {
			Ok(())
		}
	}
}
