// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur while resolving clients or performing K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s configuration error: {message}")]
	Configuration { message: String },

	#[error("User '{identity}' is not authorized to {verb} {resource}{}: {reason}", namespace_suffix(.namespace))]
	Forbidden {
		identity: String,
		verb: String,
		resource: String,
		namespace: Option<String>,
		reason: String,
	},

	#[error("Unauthenticated: {message}")]
	Unauthenticated { message: String },

	#[error("{kind} not found: {name}")]
	NotFound { kind: String, name: String },

	#[error("{kind} already exists or was modified: {name}")]
	Conflict { kind: String, name: String },

	#[error("K8s API error ({code} {reason}): {message}")]
	Api {
		code: u16,
		reason: String,
		message: String,
	},

	#[error("Failed to build client for '{identity}': {message}")]
	ClientConstruction { identity: String, message: String },

	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },

	#[error("Request cancelled")]
	Cancelled,

	#[error("K8s transport error: {message}")]
	Transport { message: String },
}

fn namespace_suffix(namespace: &Option<String>) -> String {
	match namespace {
		Some(ns) => format!(" in namespace '{ns}'"),
		None => String::new(),
	}
}

/// Coarse classification of [`K8sError`] for callers that only need to know
/// who is responsible for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Startup-time failure; the process cannot serve requests.
	Configuration,
	/// The authorization gate rejected the request.
	Authorization,
	/// The control plane answered with an error (not found, conflict, ...).
	Remote,
	/// The client factory could not build a client for the identity.
	ClientConstruction,
	/// The request itself could not be executed (bad reference, cancelled,
	/// unauthenticated).
	Request,
}

impl K8sError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			K8sError::Configuration { .. } => ErrorKind::Configuration,
			K8sError::Forbidden { .. } => ErrorKind::Authorization,
			K8sError::NotFound { .. }
			| K8sError::Conflict { .. }
			| K8sError::Api { .. }
			| K8sError::Transport { .. } => ErrorKind::Remote,
			K8sError::ClientConstruction { .. } => ErrorKind::ClientConstruction,
			K8sError::Unauthenticated { .. }
			| K8sError::InvalidRequest { .. }
			| K8sError::Cancelled => ErrorKind::Request,
		}
	}

	/// HTTP status the control plane answered with, if the error came from it.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			K8sError::NotFound { .. } => Some(404),
			K8sError::Conflict { .. } => Some(409),
			K8sError::Api { code, .. } => Some(*code),
			_ => None,
		}
	}

	/// Attach the addressed resource to a bare [`kube::Error`] so that 404 and
	/// 409 responses say what was missing or conflicting.
	pub(crate) fn from_kube(err: kube::Error, kind: &str, name: Option<&str>) -> Self {
		match err {
			kube::Error::Api(resp) if resp.code == 404 => K8sError::NotFound {
				kind: kind.to_string(),
				name: name.unwrap_or(resp.message.as_str()).to_string(),
			},
			kube::Error::Api(resp) if resp.code == 409 => K8sError::Conflict {
				kind: kind.to_string(),
				name: name.unwrap_or(resp.message.as_str()).to_string(),
			},
			other => other.into(),
		}
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		match err {
			kube::Error::Api(resp) => match resp.code {
				404 => K8sError::NotFound {
					kind: "resource".to_string(),
					name: resp.message,
				},
				409 => K8sError::Conflict {
					kind: "resource".to_string(),
					name: resp.message,
				},
				code => K8sError::Api {
					code,
					reason: resp.reason,
					message: resp.message,
				},
			},
			kube::Error::BuildRequest(e) => K8sError::InvalidRequest {
				message: e.to_string(),
			},
			other => K8sError::Transport {
				message: other.to_string(),
			},
		}
	}
}

impl From<kube::core::request::Error> for K8sError {
	fn from(err: kube::core::request::Error) -> Self {
		K8sError::InvalidRequest {
			message: err.to_string(),
		}
	}
}
