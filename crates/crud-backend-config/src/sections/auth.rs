// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller identity and authorization gate section.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

fn default_userid_header() -> String {
	"kubeflow-userid".to_string()
}

/// Which accessors go through the authorization gate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthGateMode {
	#[default]
	Selective,
	Strict,
}

impl fmt::Display for AuthGateMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AuthGateMode::Selective => f.write_str("selective"),
			AuthGateMode::Strict => f.write_str("strict"),
		}
	}
}

impl FromStr for AuthGateMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"selective" => Ok(AuthGateMode::Selective),
			"strict" => Ok(AuthGateMode::Strict),
			other => Err(format!("expected 'selective' or 'strict', got '{other}'")),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthConfigLayer {
	pub userid_header: Option<String>,
	pub userid_prefix: Option<String>,
	pub disable_auth: Option<bool>,
	pub gate_mode: Option<AuthGateMode>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.userid_header.is_some() {
			self.userid_header = other.userid_header;
		}
		if other.userid_prefix.is_some() {
			self.userid_prefix = other.userid_prefix;
		}
		if other.disable_auth.is_some() {
			self.disable_auth = other.disable_auth;
		}
		if other.gate_mode.is_some() {
			self.gate_mode = other.gate_mode;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			userid_header: self.userid_header.unwrap_or_else(default_userid_header),
			userid_prefix: self.userid_prefix.unwrap_or_default(),
			disable_auth: self.disable_auth.unwrap_or(false),
			gate_mode: self.gate_mode.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
	/// Header set by the authenticating proxy with the caller's user id.
	pub userid_header: String,
	/// Stripped from the header value when present, e.g. `accounts.google.com:`.
	pub userid_prefix: String,
	/// Run every request as the service identity and skip authorization.
	pub disable_auth: bool,
	pub gate_mode: AuthGateMode,
}

impl Default for AuthConfig {
	fn default() -> Self {
		AuthConfigLayer::default().finalize()
	}
}
