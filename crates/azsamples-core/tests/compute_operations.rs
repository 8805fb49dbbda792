//! Integration tests for the compute wrappers against a fake Resource Manager

mod common;

use azsamples_core::{CoreError, ImageListOptions};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn operation_path(name: &str) -> String {
    format!(
        "/subscriptions/{}/providers/Microsoft.Compute/locations/westus2/operations/{}",
        SUBSCRIPTION, name
    )
}

fn vm_params() -> serde_json::Value {
    json!({
        "location": "westus2",
        "properties": {
            "hardwareProfile": { "vmSize": "Standard_B1s" },
            "osProfile": { "computerName": "vm-1", "adminUsername": "azureuser" }
        }
    })
}

// ============================================================================
// Virtual machine create / update
// ============================================================================

#[tokio::test]
async fn test_create_vm_submits_once_and_waits_for_async_operation() {
    let arm = MockArm::start().await;
    let vm_path = compute_path("virtualMachines/vm-1");
    let op_path = operation_path("op-create");
    let params = vm_params();

    Mock::given(method("PUT"))
        .and(path(vm_path.as_str()))
        .and(query_param("api-version", "2024-07-01"))
        .and(body_json(&params))
        .respond_with(
            async_operation(&arm.url(&op_path))
                .set_body_json(json!({"properties": {"provisioningState": "Creating"}})),
        )
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond_times("GET", &op_path, 2, operation_status("InProgress"))
        .await;
    arm.respond("GET", &op_path, 200, json!({"status": "Succeeded"}))
        .await;
    arm.respond(
        "GET",
        &vm_path,
        200,
        json!({
            "id": vm_path,
            "name": "vm-1",
            "properties": {"provisioningState": "Succeeded"}
        }),
    )
    .await;

    let id = arm
        .factory()
        .virtual_machines()
        .create_or_update(RESOURCE_GROUP, "vm-1", &params, &fast_options())
        .await
        .unwrap();

    assert_eq!(id, vm_path);
    assert_eq!(arm.count("GET", &op_path).await, 3);
    assert_eq!(arm.count("PUT", &vm_path).await, 1);
}

#[tokio::test]
async fn test_create_returns_request_path_when_payload_has_no_id() {
    let arm = MockArm::start().await;
    let vm_path = compute_path("virtualMachines/vm-noid");

    // Completed inline, and the service left out the id
    arm.respond(
        "PUT",
        &vm_path,
        200,
        json!({"name": "vm-noid", "properties": {"provisioningState": "Succeeded"}}),
    )
    .await;

    let id = arm
        .factory()
        .virtual_machines()
        .create_or_update(RESOURCE_GROUP, "vm-noid", &vm_params(), &fast_options())
        .await
        .unwrap();

    assert_eq!(id, vm_path);
}

#[tokio::test]
async fn test_update_vm_follows_provisioning_state() {
    let arm = MockArm::start().await;
    let vm_path = compute_path("virtualMachines/vm-1");
    let patch = json!({"tags": {"env": "test"}});

    Mock::given(method("PATCH"))
        .and(path(vm_path.as_str()))
        .and(body_json(&patch))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"properties": {"provisioningState": "Updating"}})),
        )
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond_times(
        "GET",
        &vm_path,
        1,
        ResponseTemplate::new(200)
            .set_body_json(json!({"properties": {"provisioningState": "Updating"}})),
    )
    .await;
    arm.respond(
        "GET",
        &vm_path,
        200,
        json!({"id": vm_path, "properties": {"provisioningState": "Succeeded"}}),
    )
    .await;

    let id = arm
        .factory()
        .virtual_machines()
        .update(RESOURCE_GROUP, "vm-1", &patch, &fast_options())
        .await
        .unwrap();

    assert_eq!(id, vm_path);
    assert_eq!(arm.count("GET", &vm_path).await, 2);
}

#[tokio::test]
async fn test_failed_operation_carries_service_error() {
    let arm = MockArm::start().await;
    let vm_path = compute_path("virtualMachines/vm-big");
    let op_path = operation_path("op-failed");

    Mock::given(method("PUT"))
        .and(path(vm_path.as_str()))
        .respond_with(async_operation(&arm.url(&op_path)))
        .mount(&arm.server)
        .await;
    arm.respond(
        "GET",
        &op_path,
        200,
        json!({
            "status": "Failed",
            "error": {
                "code": "AllocationFailed",
                "message": "Allocation failed. We do not have sufficient capacity."
            }
        }),
    )
    .await;

    let err = arm
        .factory()
        .virtual_machines()
        .create_or_update(RESOURCE_GROUP, "vm-big", &vm_params(), &fast_options())
        .await
        .unwrap_err();

    match err {
        CoreError::OperationFailed {
            status,
            code,
            message,
        } => {
            assert_eq!(status, "Failed");
            assert_eq!(code, "AllocationFailed");
            assert!(message.contains("sufficient capacity"));
        }
        other => panic!("expected OperationFailed, got {:?}", other),
    }
    // Terminal failure: the resource is never fetched
    assert_eq!(arm.count("GET", &vm_path).await, 0);
}

#[tokio::test]
async fn test_canceled_operation_is_reported_as_failed() {
    let arm = MockArm::start().await;
    let vm_path = compute_path("virtualMachines/vm-1");
    let op_path = operation_path("op-canceled");

    Mock::given(method("POST"))
        .and(path(format!("{}/deallocate", vm_path).as_str()))
        .respond_with(
            ResponseTemplate::new(202).insert_header("Azure-AsyncOperation", arm.url(&op_path)),
        )
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond("GET", &op_path, 200, json!({"status": "Canceled"}))
        .await;

    let err = arm
        .factory()
        .virtual_machines()
        .deallocate(RESOURCE_GROUP, "vm-1", &fast_options())
        .await
        .unwrap_err();

    match err {
        CoreError::OperationFailed { status, code, .. } => {
            assert_eq!(status, "Canceled");
            assert_eq!(code, "Canceled");
        }
        other => panic!("expected OperationFailed, got {:?}", other),
    }
    // Terminal on the first poll
    assert_eq!(arm.count("GET", &op_path).await, 1);
}

#[tokio::test]
async fn test_submission_error_is_returned_without_polling() {
    let arm = MockArm::start().await;
    let vm_path = compute_path("virtualMachines/vm-1");

    arm.respond(
        "PUT",
        &vm_path,
        409,
        json!({
            "error": {
                "code": "OperationNotAllowed",
                "message": "Operation 'create' is not allowed while another operation is in progress."
            }
        }),
    )
    .await;

    let err = arm
        .factory()
        .virtual_machines()
        .create_or_update(RESOURCE_GROUP, "vm-1", &vm_params(), &fast_options())
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.to_string().contains("OperationNotAllowed"));
    assert_eq!(arm.server.received_requests().await.unwrap().len(), 1);
}

// ============================================================================
// Virtual machine actions
// ============================================================================

#[tokio::test]
async fn test_delete_vm_follows_location_header() {
    let arm = MockArm::start().await;
    let vm_path = compute_path("virtualMachines/vm-1");
    let op_path = operation_path("op-delete");

    Mock::given(method("DELETE"))
        .and(path(vm_path.as_str()))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", arm.url(&op_path)))
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond_times("GET", &op_path, 1, ResponseTemplate::new(202))
        .await;
    arm.respond_times("GET", &op_path, 1, ResponseTemplate::new(204))
        .await;

    arm.factory()
        .virtual_machines()
        .delete(RESOURCE_GROUP, "vm-1", &fast_options())
        .await
        .unwrap();

    assert_eq!(arm.count("GET", &op_path).await, 2);
}

#[tokio::test]
async fn test_power_actions_post_to_action_paths() {
    let arm = MockArm::start().await;
    let vms = arm.factory().virtual_machines();

    for action in ["start", "powerOff", "restart", "deallocate", "redeploy"] {
        Mock::given(method("POST"))
            .and(path(compute_path(&format!("virtualMachines/vm-1/{}", action)).as_str()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&arm.server)
            .await;
    }

    let opts = fast_options();
    vms.start(RESOURCE_GROUP, "vm-1", &opts).await.unwrap();
    vms.power_off(RESOURCE_GROUP, "vm-1", &opts).await.unwrap();
    vms.restart(RESOURCE_GROUP, "vm-1", &opts).await.unwrap();
    vms.deallocate(RESOURCE_GROUP, "vm-1", &opts).await.unwrap();
    vms.redeploy(RESOURCE_GROUP, "vm-1", &opts).await.unwrap();
}

#[tokio::test]
async fn test_run_command_returns_operation_output() {
    let arm = MockArm::start().await;
    let op_path = operation_path("op-run");
    let script = json!({"commandId": "RunShellScript", "script": ["echo hello"]});

    Mock::given(method("POST"))
        .and(path(compute_path("virtualMachines/vm-1/runCommand").as_str()))
        .and(body_json(&script))
        .respond_with(
            ResponseTemplate::new(202).insert_header("Azure-AsyncOperation", arm.url(&op_path)),
        )
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond(
        "GET",
        &op_path,
        200,
        json!({
            "status": "Succeeded",
            "properties": {
                "output": {
                    "value": [{"code": "ProvisioningState/succeeded", "message": "hello\n"}]
                }
            }
        }),
    )
    .await;

    let output = arm
        .factory()
        .virtual_machines()
        .run_command(RESOURCE_GROUP, "vm-1", &script, &fast_options())
        .await
        .unwrap();

    assert_eq!(output["value"][0]["message"], "hello\n");
}

#[tokio::test]
async fn test_run_command_reads_result_from_final_location() {
    let arm = MockArm::start().await;
    let op_path = operation_path("op-run-2");
    let result_path = format!("{}/result", op_path);
    let script = json!({"commandId": "RunPowerShellScript", "script": ["hostname"]});

    Mock::given(method("POST"))
        .and(path(compute_path("virtualMachines/vm-1/runCommand").as_str()))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Azure-AsyncOperation", arm.url(&op_path))
                .insert_header("Location", arm.url(&result_path)),
        )
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond_times("GET", &op_path, 1, operation_status("InProgress"))
        .await;
    arm.respond("GET", &op_path, 200, json!({"status": "Succeeded"}))
        .await;
    Mock::given(method("GET"))
        .and(path(result_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"code": "ComponentStatus/StdOut/succeeded", "message": "vm-1"}]
        })))
        .expect(1)
        .mount(&arm.server)
        .await;

    let output = arm
        .factory()
        .virtual_machines()
        .run_command(RESOURCE_GROUP, "vm-1", &script, &fast_options())
        .await
        .unwrap();

    assert_eq!(output["value"][0]["message"], "vm-1");
    assert_eq!(arm.count("GET", &op_path).await, 2);
}

#[tokio::test]
async fn test_generalize_is_synchronous() {
    let arm = MockArm::start().await;
    let generalize = compute_path("virtualMachines/vm-1/generalize");
    Mock::given(method("POST"))
        .and(path(generalize.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&arm.server)
        .await;

    arm.factory()
        .virtual_machines()
        .generalize(RESOURCE_GROUP, "vm-1")
        .await
        .unwrap();
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_get_vm_passes_expand_and_encodes_names() {
    let arm = MockArm::start().await;
    Mock::given(method("GET"))
        .and(path(compute_path("virtualMachines/vm%201").as_str()))
        .and(query_param("$expand", "instanceView"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "vm 1"})))
        .expect(1)
        .mount(&arm.server)
        .await;

    let vm = arm
        .factory()
        .virtual_machines()
        .get(RESOURCE_GROUP, "vm 1", Some("instanceView"))
        .await
        .unwrap();
    assert_eq!(vm["name"], "vm 1");
}

#[tokio::test]
async fn test_get_missing_vm_is_not_found() {
    let arm = MockArm::start().await;
    arm.respond(
        "GET",
        &compute_path("virtualMachines/ghost"),
        404,
        json!({"error": {"code": "ResourceNotFound", "message": "The Resource was not found."}}),
    )
    .await;

    let err = arm
        .factory()
        .virtual_machines()
        .get(RESOURCE_GROUP, "ghost", None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_image_listing_accepts_bare_arrays() {
    let arm = MockArm::start().await;
    let skus = format!(
        "/subscriptions/{}/providers/Microsoft.Compute/locations/westus2/publishers/Canonical/artifacttypes/vmimage/offers/UbuntuServer/skus",
        SUBSCRIPTION
    );
    arm.respond(
        "GET",
        &skus,
        200,
        json!([{"name": "18.04-LTS"}, {"name": "20.04-LTS"}]),
    )
    .await;

    let versions = format!("{}/18.04-LTS/versions", skus);
    Mock::given(method("GET"))
        .and(path(versions.as_str()))
        .and(query_param("$top", "1"))
        .and(query_param("$orderby", "name desc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"name": "18.04.202401010"}])),
        )
        .mount(&arm.server)
        .await;

    let images = arm.factory().virtual_machine_images();
    let found = images
        .list_skus("westus2", "Canonical", "UbuntuServer")
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let latest = images
        .list(
            "westus2",
            "Canonical",
            "UbuntuServer",
            "18.04-LTS",
            &ImageListOptions {
                top: Some(1),
                orderby: Some("name desc".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(latest[0]["name"], "18.04.202401010");
}

// ============================================================================
// Scale sets
// ============================================================================

#[tokio::test]
async fn test_scale_set_update_instances_sends_instance_ids() {
    let arm = MockArm::start().await;
    Mock::given(method("POST"))
        .and(path(compute_path("virtualMachineScaleSets/ss-1/manualupgrade").as_str()))
        .and(body_json(json!({"instanceIds": ["0", "3"]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&arm.server)
        .await;

    arm.factory()
        .virtual_machine_scale_sets()
        .update_instances(RESOURCE_GROUP, "ss-1", &["0", "3"], &fast_options())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_scale_set_vm_update_uses_put_on_instance() {
    let arm = MockArm::start().await;
    let instance = compute_path("virtualMachineScaleSets/ss-1/virtualMachines/3");
    let params = json!({
        "location": "westus2",
        "properties": {"protectionPolicy": {"protectFromScaleIn": true}}
    });

    Mock::given(method("PUT"))
        .and(path(instance.as_str()))
        .and(body_json(&params))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"instanceId": "3"})))
        .expect(1)
        .mount(&arm.server)
        .await;

    let id = arm
        .factory()
        .virtual_machine_scale_set_vms()
        .update(RESOURCE_GROUP, "ss-1", "3", &params, &fast_options())
        .await
        .unwrap();
    assert_eq!(id, instance);
}

#[tokio::test]
async fn test_rolling_upgrade_cancel_and_latest() {
    let arm = MockArm::start().await;
    let base = compute_path("virtualMachineScaleSets/ss-1/rollingUpgrades");
    Mock::given(method("POST"))
        .and(path(format!("{}/cancel", base).as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond(
        "GET",
        &format!("{}/latest", base),
        200,
        json!({"properties": {"runningStatus": {"code": "Cancelled"}}}),
    )
    .await;

    let upgrades = arm.factory().rolling_upgrades();
    upgrades
        .cancel(RESOURCE_GROUP, "ss-1", &fast_options())
        .await
        .unwrap();
    let latest = upgrades.get_latest(RESOURCE_GROUP, "ss-1").await.unwrap();
    assert_eq!(latest["properties"]["runningStatus"]["code"], "Cancelled");
}

// ============================================================================
// Extensions and run commands
// ============================================================================

#[tokio::test]
async fn test_extension_create_and_list() {
    let arm = MockArm::start().await;
    let ext = compute_path("virtualMachines/vm-1/extensions/CustomScript");
    let params = json!({
        "location": "westus2",
        "properties": {
            "publisher": "Microsoft.Azure.Extensions",
            "type": "CustomScript",
            "typeHandlerVersion": "2.1"
        }
    });
    Mock::given(method("PUT"))
        .and(path(ext.as_str()))
        .and(body_json(&params))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": ext, "name": "CustomScript"})),
        )
        .expect(1)
        .mount(&arm.server)
        .await;
    arm.respond(
        "GET",
        &compute_path("virtualMachines/vm-1/extensions"),
        200,
        json!({"value": [{"name": "CustomScript"}]}),
    )
    .await;

    let extensions = arm.factory().virtual_machine_extensions();
    let id = extensions
        .create_or_update(RESOURCE_GROUP, "vm-1", "CustomScript", &params, &fast_options())
        .await
        .unwrap();
    assert_eq!(id, ext);

    let installed = extensions.list(RESOURCE_GROUP, "vm-1", None).await.unwrap();
    assert_eq!(installed.len(), 1);
}

#[tokio::test]
async fn test_builtin_run_commands_are_location_scoped() {
    let arm = MockArm::start().await;
    let builtins = format!(
        "/subscriptions/{}/providers/Microsoft.Compute/locations/eastus/runCommands",
        SUBSCRIPTION
    );
    arm.respond(
        "GET",
        &builtins,
        200,
        json!({"value": [{"id": "RunShellScript"}, {"id": "RunPowerShellScript"}]}),
    )
    .await;
    arm.respond(
        "GET",
        &format!("{}/RunShellScript", builtins),
        200,
        json!({"id": "RunShellScript", "osType": "Linux"}),
    )
    .await;

    let run_commands = arm.factory().run_commands();
    assert_eq!(run_commands.list("eastus").await.unwrap().len(), 2);
    let command = run_commands.get("eastus", "RunShellScript").await.unwrap();
    assert_eq!(command["osType"], "Linux");
}
