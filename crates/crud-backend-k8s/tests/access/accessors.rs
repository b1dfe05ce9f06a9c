// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use crud_backend_k8s::{
	ApiFamily, Attribution, DryRun, ErrorKind, GateMode, Identity, K8sError, PatchStrategy,
	PropagationPolicy, ResourceKind, ResourceRef, DEFAULT_CLASS_ANNOTATION,
};
use serde_json::json;

use super::support::{ctx, item_names, named, TestBackend};

fn event(name: &str, kind: &str, involved: &str) -> serde_json::Value {
	json!({
		"metadata": { "name": name },
		"involvedObject": { "kind": kind, "name": involved },
		"reason": "Scheduled",
	})
}

#[tokio::test]
async fn deletes_use_foreground_propagation() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let pvcs = ResourceRef::namespaced(ResourceKind::persistent_volume_claims(), "ns1").unwrap();
	let notebooks = ResourceRef::namespaced(ResourceKind::notebooks(), "ns1").unwrap();
	backend.cluster.seed(&pvcs, named("data"));
	backend.cluster.seed(&notebooks, named("nb"));

	backend.access.delete_pvc(&alice, "ns1", "data").await.unwrap();
	assert_eq!(backend.cluster.last_call().propagation, Some(PropagationPolicy::Foreground));

	backend.access.delete_notebook(&alice, "ns1", "nb").await.unwrap();
	assert_eq!(backend.cluster.last_call().propagation, Some(PropagationPolicy::Foreground));
	assert_eq!(backend.cluster.last_call().name.as_deref(), Some("nb"));
}

#[tokio::test]
async fn custom_resource_delete_defaults_to_foreground() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let tensorboards = ResourceKind::namespaced(
		"tensorboard.kubeflow.org",
		"v1alpha1",
		"Tensorboard",
		"tensorboards",
	);
	let collection = ResourceRef::namespaced(tensorboards.clone(), "ns1").unwrap();
	backend.cluster.seed(&collection, named("tb-a"));
	backend.cluster.seed(&collection, named("tb-b"));

	backend
		.access
		.delete_custom_resource(&alice, &tensorboards, Some("ns1"), "tb-a", None)
		.await
		.unwrap();
	assert_eq!(backend.cluster.last_call().propagation, Some(PropagationPolicy::Foreground));

	backend
		.access
		.delete_custom_resource(
			&alice,
			&tensorboards,
			Some("ns1"),
			"tb-b",
			Some(PropagationPolicy::Background),
		)
		.await
		.unwrap();
	assert_eq!(backend.cluster.last_call().propagation, Some(PropagationPolicy::Background));
	assert_eq!(
		backend.cluster.last_call().path,
		"/apis/tensorboard.kubeflow.org/v1alpha1/namespaces/ns1/tensorboards"
	);
}

#[tokio::test]
async fn event_listing_filters_on_the_server() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let events = ResourceRef::namespaced(ResourceKind::events(), "ns1").unwrap();
	backend.cluster.seed(&events, event("e1", "Notebook", "nb-1"));
	backend.cluster.seed(&events, event("e2", "Notebook", "nb-2"));
	backend.cluster.seed(&events, event("e3", "PersistentVolumeClaim", "nb-1"));
	backend.cluster.seed(&events, event("e4", "PersistentVolumeClaim", "data"));

	let nb_events = backend.access.list_notebook_events(&alice, "ns1", "nb-1").await.unwrap();
	assert_eq!(item_names(&nb_events), vec!["e1"]);
	let call = backend.cluster.last_call();
	assert_eq!(
		call.selectors.field_selector.as_deref(),
		Some("involvedObject.kind=Notebook,involvedObject.name=nb-1")
	);
	assert_eq!(call.path, "/api/v1/namespaces/ns1/events");

	let pvc_events = backend.access.list_pvc_events(&alice, "ns1", "data").await.unwrap();
	assert_eq!(item_names(&pvc_events), vec!["e4"]);
	assert_eq!(
		backend.cluster.last_call().selectors.field_selector.as_deref(),
		Some("involvedObject.kind=PersistentVolumeClaim,involvedObject.name=data")
	);

	// events always come through the core cache, even for notebooks
	assert!(backend
		.factory
		.built()
		.iter()
		.all(|(family, _)| *family == ApiFamily::Core));
}

#[tokio::test]
async fn notebook_lifecycle() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let body = json!({
		"apiVersion": "kubeflow.org/v1beta1",
		"kind": "Notebook",
		"metadata": { "name": "jupyter", "labels": { "app": "jupyter" } },
		"spec": { "template": { "spec": { "containers": [{ "name": "jupyter", "image": "jupyter/base" }] } } },
	});

	let dry = backend
		.access
		.create_notebook(&alice, "ns1", &body, DryRun::All)
		.await
		.unwrap();
	assert_eq!(dry["metadata"]["name"], "jupyter");
	assert!(item_names(&backend.access.list_notebooks(&alice, "ns1").await.unwrap()).is_empty());

	backend
		.access
		.create_notebook(&alice, "ns1", &body, DryRun::Off)
		.await
		.unwrap();
	let err = backend
		.access
		.create_notebook(&alice, "ns1", &body, DryRun::Off)
		.await
		.unwrap_err();
	assert!(matches!(err, K8sError::Conflict { .. }));

	let patched = backend
		.access
		.patch_notebook(
			&alice,
			"ns1",
			"jupyter",
			&json!({ "metadata": { "annotations": { "kubeflow-resource-stopped": "true" } } }),
		)
		.await
		.unwrap();
	assert_eq!(patched["metadata"]["annotations"]["kubeflow-resource-stopped"], "true");
	assert_eq!(patched["metadata"]["labels"]["app"], "jupyter");
	assert_eq!(backend.cluster.last_call().patch, Some(PatchStrategy::Merge));

	let fetched = backend.access.get_notebook(&alice, "ns1", "jupyter").await.unwrap();
	assert_eq!(fetched, patched);
	assert_eq!(
		backend.factory.built(),
		vec![(ApiFamily::CustomObjects, Identity::new("alice"))]
	);
}

#[tokio::test]
async fn pvc_patch_attribution_is_explicit() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let pvcs = ResourceRef::namespaced(ResourceKind::persistent_volume_claims(), "ns1").unwrap();
	backend.cluster.seed(&pvcs, named("data"));
	let patch = json!({ "metadata": { "labels": { "owner": "alice" } } });

	backend
		.access
		.patch_pvc(&alice, "ns1", "data", &patch, Attribution::Caller)
		.await
		.unwrap();
	let call = backend.cluster.last_call();
	assert_eq!(call.identity, Identity::new("alice"));
	assert_eq!(call.patch, Some(PatchStrategy::StrategicMerge));

	backend
		.access
		.patch_pvc(&alice, "ns1", "data", &patch, Attribution::Service)
		.await
		.unwrap();
	assert!(backend.cluster.last_call().identity.is_ambient());

	let pvc = backend.access.get_pvc(&alice, "ns1", "data").await.unwrap();
	assert_eq!(pvc["metadata"]["labels"]["owner"], "alice");
}

#[tokio::test]
async fn secrets_and_logs_follow_attribution() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let secret = json!({ "metadata": { "name": "creds" }, "stringData": { "token": "t" } });

	backend
		.access
		.create_secret(&alice, "ns1", &secret, Attribution::Caller)
		.await
		.unwrap();
	assert_eq!(backend.cluster.last_call().identity, Identity::new("alice"));

	let fetched = backend
		.access
		.get_secret(&alice, "ns1", "creds", Attribution::Service)
		.await
		.unwrap();
	assert_eq!(fetched["stringData"]["token"], "t");
	assert!(backend.cluster.last_call().identity.is_ambient());

	let logs = backend
		.access
		.get_pod_logs(&alice, "ns1", "web-0", Some("sidecar"), Attribution::Caller)
		.await
		.unwrap();
	assert_eq!(logs, "web-0/sidecar: ready\n");
	assert_eq!(backend.cluster.last_call().container.as_deref(), Some("sidecar"));
}

#[tokio::test]
async fn pod_listing_passes_label_selector() {
	let backend = TestBackend::new(GateMode::Selective);
	let pods = ResourceRef::namespaced(ResourceKind::pods(), "ns1").unwrap();
	backend
		.cluster
		.seed(&pods, json!({ "metadata": { "name": "nb-0", "labels": { "notebook-name": "nb" } } }));
	backend
		.cluster
		.seed(&pods, json!({ "metadata": { "name": "other", "labels": { "app": "x" } } }));

	let list = backend
		.access
		.list_pods(&ctx("alice"), "ns1", Some("notebook-name=nb"), Attribution::Caller)
		.await
		.unwrap();
	assert_eq!(item_names(&list), vec!["nb-0"]);
	assert_eq!(
		backend.cluster.last_call().selectors.label_selector.as_deref(),
		Some("notebook-name=nb")
	);
}

#[tokio::test]
async fn poddefaults_and_storage_classes_use_their_families() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let poddefaults = ResourceRef::namespaced(ResourceKind::pod_defaults(), "ns1").unwrap();
	let classes = ResourceRef::cluster(ResourceKind::storage_classes()).unwrap();
	backend.cluster.seed(&poddefaults, named("add-gcp-secret"));
	backend.cluster.seed(&classes, named("standard"));
	backend.cluster.seed(
		&classes,
		json!({ "metadata": { "name": "premium", "annotations": { DEFAULT_CLASS_ANNOTATION: "true" } } }),
	);

	let list = backend.access.list_poddefaults(&alice, "ns1").await.unwrap();
	assert_eq!(item_names(&list), vec!["add-gcp-secret"]);
	assert_eq!(
		backend.cluster.last_call().path,
		"/apis/kubeflow.org/v1alpha1/namespaces/ns1/poddefaults"
	);

	let default = backend.access.get_default_storage_class(&alice).await.unwrap().unwrap();
	assert_eq!(default["metadata"]["name"], "premium");

	let families: Vec<ApiFamily> = backend.factory.built().into_iter().map(|(f, _)| f).collect();
	assert_eq!(families, vec![ApiFamily::CustomObjects, ApiFamily::Storage]);
}

#[tokio::test]
async fn missing_default_storage_class_is_none() {
	let backend = TestBackend::new(GateMode::Selective);
	let classes = ResourceRef::cluster(ResourceKind::storage_classes()).unwrap();
	backend.cluster.seed(&classes, named("standard"));
	assert!(backend
		.access
		.get_default_storage_class(&ctx("alice"))
		.await
		.unwrap()
		.is_none());
}

#[tokio::test]
async fn remote_errors_pass_through_unchanged() {
	let backend = TestBackend::new(GateMode::Selective);
	let err = backend.access.get_pvc(&ctx("alice"), "ns1", "missing").await.unwrap_err();
	match &err {
		K8sError::NotFound { kind, name } => {
			assert_eq!(kind, "PersistentVolumeClaim");
			assert_eq!(name, "missing");
		}
		other => panic!("expected NotFound, got {other:?}"),
	}
	assert_eq!(err.kind(), ErrorKind::Remote);
}

#[tokio::test]
async fn empty_namespace_is_rejected_before_any_call() {
	let backend = TestBackend::new(GateMode::Selective);
	let err = backend.access.list_pvcs(&ctx("alice"), "").await.unwrap_err();
	assert!(matches!(err, K8sError::InvalidRequest { .. }));

	let crd = ResourceKind::namespaced("example.com", "v1", "Widget", "widgets");
	let err = backend
		.access
		.list_custom_resources(&ctx("alice"), &crd, None)
		.await
		.unwrap_err();
	assert!(matches!(err, K8sError::InvalidRequest { .. }));

	assert_eq!(backend.cluster.call_count(), 0);
	assert_eq!(backend.factory.builds(), 0);
}

#[tokio::test]
async fn unsafe_path_segments_are_rejected_before_any_call() {
	let backend = TestBackend::new(GateMode::Strict);
	backend.reviewer.allow("alice", "get", "secrets");
	backend.reviewer.allow("alice", "list", "events");
	let alice = ctx("alice");

	let err = backend
		.access
		.get_secret(&alice, "ns1/secrets/x", "token", Attribution::Caller)
		.await
		.unwrap_err();
	assert!(matches!(err, K8sError::InvalidRequest { .. }));

	let err = backend
		.access
		.get_secret(&alice, "ns1", "token?dryRun=All", Attribution::Caller)
		.await
		.unwrap_err();
	assert!(matches!(err, K8sError::InvalidRequest { .. }));

	let err = backend
		.access
		.list_pvc_events(&alice, "ns1", "data,involvedObject.kind=Secret")
		.await
		.unwrap_err();
	assert!(matches!(err, K8sError::InvalidRequest { .. }));

	let err = backend
		.access
		.list_notebook_events(&alice, "ns1", "../nb")
		.await
		.unwrap_err();
	assert!(matches!(err, K8sError::InvalidRequest { .. }));

	assert!(backend.reviewer.asked().is_empty());
	assert_eq!(backend.cluster.call_count(), 0);
	assert_eq!(backend.factory.builds(), 0);
}

#[tokio::test]
async fn cluster_scoped_custom_resources() {
	let backend = TestBackend::new(GateMode::Selective);
	let alice = ctx("alice");
	let profiles = ResourceKind::cluster_scoped("kubeflow.org", "v1", "Profile", "profiles");

	backend
		.access
		.create_custom_resource(&alice, &profiles, None, &named("alice"))
		.await
		.unwrap();
	let profile = backend
		.access
		.get_custom_resource(&alice, &profiles, None, "alice")
		.await
		.unwrap();
	assert_eq!(profile["metadata"]["name"], "alice");

	backend
		.access
		.patch_custom_resource(
			&alice,
			&profiles,
			None,
			"alice",
			&json!({ "spec": { "owner": "alice" } }),
		)
		.await
		.unwrap();
	let list = backend
		.access
		.list_custom_resources(&alice, &profiles, None)
		.await
		.unwrap();
	assert_eq!(list["items"][0]["spec"]["owner"], "alice");
	assert_eq!(backend.cluster.last_call().path, "/apis/kubeflow.org/v1/profiles");
}
