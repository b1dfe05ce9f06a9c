// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Identity-scoped Kubernetes access for multi-tenant CRUD backends.
//!
//! This crate provides:
//! - Resolution of the service's ambient credential
//! - A client factory that impersonates the calling user
//! - Bounded, identity-keyed client caches (one per API family)
//! - An authorization gate backed by `SubjectAccessReview`
//! - Resource accessors for namespaces, pods, PVCs, secrets, events,
//!   storage classes, notebooks, pod defaults and arbitrary custom resources

mod accessors;
mod authz;
mod cache;
mod control_plane;
mod credential;
mod error;
mod factory;
mod identity;
mod resource;

pub use accessors::{
	default_storage_class, ResourceAccess, BETA_DEFAULT_CLASS_ANNOTATION, DEFAULT_CLASS_ANNOTATION,
};
pub use authz::{
	AccessCheck, AccessReviewer, AuthorizationGate, AuthzDecision, GateMode, SubjectAccessReviewer,
};
pub use cache::{CacheCapacities, ClientCache, ClientRegistry, DEFAULT_CAPACITY};
pub use control_plane::{ControlPlane, KubeControlPlane};
pub use credential::{AmbientCredential, CredentialOptions, CredentialOrigin};
pub use error::{ErrorKind, K8sError, K8sResult};
pub use factory::{ApiFamily, ClientFactory, KubeClientFactory};
pub use identity::{
	Attribution, HeaderIdentity, HeaderIdentitySource, Identity, IdentitySource, RequestContext,
	StaticIdentity,
};
pub use resource::{
	DryRun, PatchStrategy, PropagationPolicy, ResourceKind, ResourceRef, Selectors,
};
