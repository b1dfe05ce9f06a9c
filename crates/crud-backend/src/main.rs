// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! crud-backend operator CLI.

use clap::{Parser, Subcommand};
use crud_backend_config::{CrudBackendConfig, LogFormat};
use crud_backend_k8s::{
	AmbientCredential, Attribution, K8sError, RequestContext, ResourceAccess, ResourceKind,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod backend;
mod version;

/// crud-backend - identity-scoped access to a Kubernetes cluster.
#[derive(Parser, Debug)]
#[command(
	name = "crud-backend",
	about = "Identity-scoped Kubernetes access for notebook workloads",
	version
)]
struct Args {
	/// Config file (defaults to /etc/crud-backend/config.toml)
	#[arg(long, global = true, env = "CRUD_BACKEND_CONFIG")]
	config: Option<PathBuf>,

	/// Identity to act as, presented through the configured user id header
	#[arg(long = "as", global = true, value_name = "IDENTITY")]
	as_identity: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
	/// List namespaces
	Namespaces,
	/// List pods in a namespace
	Pods {
		#[arg(short, long)]
		namespace: String,
		/// Label selector, e.g. `notebook-name=demo`
		#[arg(short = 'l', long)]
		selector: Option<String>,
	},
	/// Print the logs of a pod
	Logs {
		#[arg(short, long)]
		namespace: String,
		pod: String,
		#[arg(short, long)]
		container: Option<String>,
	},
	/// List persistent volume claims
	Pvcs {
		#[arg(short, long)]
		namespace: String,
	},
	/// List events involving a persistent volume claim
	PvcEvents {
		#[arg(short, long)]
		namespace: String,
		name: String,
	},
	/// List notebooks
	Notebooks {
		#[arg(short, long)]
		namespace: String,
	},
	/// List events involving a notebook
	NotebookEvents {
		#[arg(short, long)]
		namespace: String,
		name: String,
	},
	/// List pod defaults
	Poddefaults {
		#[arg(short, long)]
		namespace: String,
	},
	/// List storage classes and the cluster default
	StorageClasses,
	/// List objects of any namespaced custom resource
	Custom {
		#[arg(short, long)]
		namespace: String,
		#[arg(long)]
		group: String,
		#[arg(long)]
		version: String,
		#[arg(long)]
		plural: String,
	},
	/// Ask whether the caller may perform a verb on a resource
	CanI {
		verb: String,
		/// Resource plural, e.g. `pods`
		resource: String,
		#[arg(short, long)]
		namespace: Option<String>,
		#[arg(long, default_value = "")]
		group: String,
		#[arg(long, default_value = "v1")]
		version: String,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	let config = match &args.config {
		Some(path) => crud_backend_config::load_config_with_file(path)?,
		None => crud_backend_config::load_config()?,
	};

	init_tracing(&config);

	// Without an ambient credential nothing can be served.
	let credential = AmbientCredential::resolve(&backend::credential_options(&config.kube)).await?;
	tracing::info!(origin = %credential.origin(), "resolved ambient credential");

	let access = backend::build_access(&config, credential)?;

	let cancellation = CancellationToken::new();
	let ctx = backend::request_context(
		&config.auth,
		args.as_identity.as_deref(),
		cancellation.clone(),
	)?;

	tokio::spawn({
		let cancellation = cancellation.clone();
		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				tracing::info!("received Ctrl+C, cancelling request");
				cancellation.cancel();
			}
		}
	});

	let output = tokio::select! {
		result = run(&access, &ctx, args.command) => result?,
		_ = cancellation.cancelled() => return Err(K8sError::Cancelled.into()),
	};

	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

fn init_tracing(config: &CrudBackendConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());

	// Logs go to stderr so stdout stays machine readable.
	let registry = tracing_subscriber::registry().with(filter);
	match config.logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
			.init(),
		LogFormat::Text => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

async fn run(
	access: &ResourceAccess,
	ctx: &RequestContext,
	command: Command,
) -> Result<Value, K8sError> {
	match command {
		Command::Version => Ok(json!({ "version": env!("CARGO_PKG_VERSION") })),
		Command::Namespaces => access.list_namespaces(ctx, Attribution::Caller).await,
		Command::Pods { namespace, selector } => {
			access
				.list_pods(ctx, &namespace, selector.as_deref(), Attribution::Caller)
				.await
		}
		Command::Logs {
			namespace,
			pod,
			container,
		} => {
			let logs = access
				.get_pod_logs(ctx, &namespace, &pod, container.as_deref(), Attribution::Caller)
				.await?;
			Ok(json!({ "pod": pod, "namespace": namespace, "logs": logs }))
		}
		Command::Pvcs { namespace } => access.list_pvcs(ctx, &namespace).await,
		Command::PvcEvents { namespace, name } => {
			access.list_pvc_events(ctx, &namespace, &name).await
		}
		Command::Notebooks { namespace } => access.list_notebooks(ctx, &namespace).await,
		Command::NotebookEvents { namespace, name } => {
			access.list_notebook_events(ctx, &namespace, &name).await
		}
		Command::Poddefaults { namespace } => access.list_poddefaults(ctx, &namespace).await,
		Command::StorageClasses => {
			let classes = access.list_storage_classes(ctx).await?;
			let default = crud_backend_k8s::default_storage_class(&classes);
			Ok(json!({ "storageClasses": classes, "default": default }))
		}
		Command::Custom {
			namespace,
			group,
			version,
			plural,
		} => {
			let kind = ResourceKind::namespaced(&group, &version, &plural, &plural);
			access.list_custom_resources(ctx, &kind, Some(&namespace)).await
		}
		Command::CanI {
			verb,
			resource,
			namespace,
			group,
			version,
		} => {
			let kind = match namespace {
				Some(_) => ResourceKind::namespaced(&group, &version, &resource, &resource),
				None => ResourceKind::cluster_scoped(&group, &version, &resource, &resource),
			};
			let allowed = access.can_i(ctx, &verb, &kind, namespace.as_deref()).await?;
			Ok(json!({
				"identity": ctx.identity().to_string(),
				"verb": verb,
				"resource": kind.to_string(),
				"namespace": namespace,
				"allowed": allowed,
			}))
		}
	}
}
