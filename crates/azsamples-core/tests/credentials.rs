//! Credential acquisition is lazy and its failures stay typed

mod common;

use std::sync::Arc;

use azsamples_core::{ClientFactory, CoreError, CredentialSource, Settings, StaticTokenCredential};
use common::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn service_principal(arm: &MockArm) -> Settings {
    Settings::new(
        SUBSCRIPTION,
        CredentialSource::ClientSecret {
            tenant_id: "tenant-1".to_string(),
            client_id: "client-1".to_string(),
            client_secret: "secret-1".to_string(),
        },
    )
    .with_endpoint(arm.uri())
    .with_authority_host(arm.uri())
}

#[tokio::test]
async fn test_factory_makes_no_requests() {
    let arm = MockArm::start().await;
    let factory = ClientFactory::new(&service_principal(&arm)).unwrap();
    let _vms = factory.virtual_machines();
    let _accounts = factory.storage_accounts();

    assert!(arm.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_token_is_acquired_on_first_call_and_reused() {
    let arm = MockArm::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "issued-token"
        })))
        .expect(1)
        .mount(&arm.server)
        .await;
    let vm_path = compute_path("virtualMachines/vm-1");
    Mock::given(method("GET"))
        .and(path(vm_path.as_str()))
        .and(header("authorization", "Bearer issued-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "vm-1"})))
        .expect(2)
        .mount(&arm.server)
        .await;

    let vms = ClientFactory::new(&service_principal(&arm))
        .unwrap()
        .virtual_machines();
    vms.get(RESOURCE_GROUP, "vm-1", None).await.unwrap();
    vms.get(RESOURCE_GROUP, "vm-1", None).await.unwrap();
}

#[tokio::test]
async fn test_rejected_token_request_surfaces_from_the_call() {
    let arm = MockArm::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "unauthorized_client",
            "error_description": "AADSTS700016: Application not found in the directory."
        })))
        .mount(&arm.server)
        .await;

    let factory = ClientFactory::new(&service_principal(&arm)).unwrap();
    let err = factory.storage_accounts().list().await.unwrap_err();

    assert!(matches!(err, CoreError::Credential(_)));
    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("AADSTS700016"));
}

#[tokio::test]
async fn test_caller_supplied_credential() {
    let arm = MockArm::start().await;
    Mock::given(method("GET"))
        .and(path(compute_path("virtualMachineScaleSets/ss-1").as_str()))
        .and(header("authorization", "Bearer caller-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ss-1"})))
        .expect(1)
        .mount(&arm.server)
        .await;

    let factory = ClientFactory::with_credential(
        &arm.settings(),
        Arc::new(StaticTokenCredential::new("caller-token")),
    )
    .unwrap();
    let scale_set = factory
        .virtual_machine_scale_sets()
        .get(RESOURCE_GROUP, "ss-1", None)
        .await
        .unwrap();
    assert_eq!(scale_set["name"], "ss-1");
}
