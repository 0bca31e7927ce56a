//! Tests for tool descriptor assembly
//!
//! Uses the sample pfSense document for module, apply and danger classification, and
//! small inline documents for the error paths.

use pfsense_toolgen::config::{ClassificationTables, ModuleRoute};
use pfsense_toolgen::generator::{
    build_tool_descriptors, ContextBuilder, GenerationSummary, HttpMethod, ParameterLocation,
    SpecDocument, ToolAction, ToolDescriptor,
};
use pfsense_toolgen::utils::is_well_formed_tool_name;
use pfsense_toolgen::GeneratorError;
use serde_json::json;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/pfsense_openapi_sample.json"
);

fn fixture_descriptors() -> Vec<ToolDescriptor> {
    let document = SpecDocument::from_file(FIXTURE).unwrap();
    build_tool_descriptors(&document, &ClassificationTables::default()).unwrap()
}

fn descriptor<'a>(descriptors: &'a [ToolDescriptor], operation_id: &str) -> &'a ToolDescriptor {
    descriptors
        .iter()
        .find(|d| d.operation_id == operation_id)
        .unwrap_or_else(|| panic!("no descriptor for {}", operation_id))
}

fn inline_document(paths: serde_json::Value) -> SpecDocument {
    let document = json!({
        "openapi": "3.0.0",
        "info": { "title": "inline", "version": "1" },
        "paths": paths,
    });
    SpecDocument::parse(&document.to_string()).unwrap()
}

#[test]
fn test_one_descriptor_per_operation() {
    let descriptors = fixture_descriptors();
    assert_eq!(descriptors.len(), 54);
    assert_eq!(descriptors[0].operation_id, "getFirewallAliasEndpoint");
}

#[test]
fn test_module_assignment() {
    let descriptors = fixture_descriptors();
    let cases = [
        ("getFirewallAliasEndpoint", "firewall"),
        ("postFirewallVirtualIPEndpoint", "firewall"),
        ("patchServicesDHCPServerEndpoint", "dhcp"),
        ("postServicesDHCPServerApplyEndpoint", "dhcp"),
        ("postServicesHAProxyBackendEndpoint", "haproxy"),
        ("getServicesNTPAdvancedSettingsEndpoint", "services"),
        ("getUserEndpoint", "user"),
        ("getUsersEndpoint", "user"),
        ("getInterfaceVLANsEndpoint", "interface"),
        ("getInterfacesEndpoint", "interface"),
        ("postGraphQLEndpoint", "graphql"),
        ("postAuthJWTEndpoint", "auth"),
        ("getVPNWireGuardPeersEndpoint", "vpn"),
    ];
    for (operation_id, module) in cases {
        assert_eq!(descriptor(&descriptors, operation_id).module, module, "{}", operation_id);
    }
}

#[test]
fn test_module_assignment_ignores_table_order() {
    let document = SpecDocument::from_file(FIXTURE).unwrap();
    let forward = ClassificationTables::default();
    let mut reversed = forward.clone();
    reversed.module_routes.reverse();

    let a = build_tool_descriptors(&document, &forward).unwrap();
    let b = build_tool_descriptors(&document, &reversed).unwrap();
    for (left, right) in a.iter().zip(&b) {
        assert_eq!(left.module, right.module, "{}", left.operation_id);
    }
}

#[test]
fn test_apply_reminders() {
    let descriptors = fixture_descriptors();

    let create = descriptor(&descriptors, "postFirewallAliasEndpoint");
    assert!(create.needs_apply);
    assert_eq!(create.apply_tool_name.as_deref(), Some("pfsense_firewall_apply"));
    assert_eq!(create.apply_endpoint.as_deref(), Some("/api/v2/firewall/apply"));

    let vip = descriptor(&descriptors, "postFirewallVirtualIPEndpoint");
    assert_eq!(vip.apply_tool_name.as_deref(), Some("pfsense_firewall_virtual_ip_apply"));

    let peer = descriptor(&descriptors, "postVPNWireGuardPeerAllowedIPEndpoint");
    assert_eq!(peer.apply_tool_name.as_deref(), Some("pfsense_vpn_wireguard_apply"));

    let dhcp = descriptor(&descriptors, "patchServicesDHCPServerEndpoint");
    assert_eq!(dhcp.apply_tool_name.as_deref(), Some("pfsense_services_dhcp_server_apply"));

    for id in [
        "postFirewallApplyEndpoint",
        "postFirewallVirtualIPApplyEndpoint",
        "getFirewallAliasEndpoint",
        "postDiagnosticsRebootEndpoint",
        "postUserEndpoint",
    ] {
        let d = descriptor(&descriptors, id);
        assert!(!d.needs_apply, "{}", id);
        assert!(d.apply_tool_name.is_none(), "{}", id);
    }

    for d in descriptors.iter().filter(|d| d.needs_apply) {
        let apply = d.apply_tool_name.as_deref().unwrap();
        assert!(apply.starts_with("pfsense_") && apply.ends_with("_apply"), "{}", apply);
        assert!(is_well_formed_tool_name(apply), "{}", apply);
        assert!(d.is_mutation);
    }
}

#[test]
fn test_apply_pair_actions() {
    let descriptors = fixture_descriptors();
    let trigger = descriptor(&descriptors, "postFirewallApplyEndpoint");
    assert_eq!(trigger.action, ToolAction::Apply);
    assert!(trigger.is_mutation);

    let status = descriptor(&descriptors, "getFirewallApplyEndpoint");
    assert_eq!(status.action, ToolAction::ApplyStatus);
    assert!(!status.is_mutation);
    assert!(!status.needs_confirmation);
}

#[test]
fn test_danger_classification() {
    let descriptors = fixture_descriptors();
    let mut dangerous: Vec<&str> = descriptors
        .iter()
        .filter(|d| d.is_dangerous)
        .map(|d| d.operation_id.as_str())
        .collect();
    dangerous.sort();
    assert_eq!(
        dangerous,
        vec![
            "deleteDiagnosticsARPTableEndpoint",
            "deleteFirewallStatesEndpoint",
            "postDiagnosticsCommandPromptEndpoint",
            "postDiagnosticsHaltSystemEndpoint",
            "postDiagnosticsRebootEndpoint",
            "postGraphQLEndpoint",
        ]
    );

    let reboot = descriptor(&descriptors, "postDiagnosticsRebootEndpoint");
    assert_eq!(
        reboot.danger_warning.as_deref(),
        Some("DANGEROUS: Reboots the pfSense system.")
    );
    assert!(reboot
        .description
        .contains("WARNING: DANGEROUS: Reboots the pfSense system."));
}

#[test]
fn test_parameter_partitions() {
    let descriptors = fixture_descriptors();

    let list = descriptor(&descriptors, "getFirewallAliasesEndpoint");
    assert!(list.accepts_filters);
    assert!(!list.has_request_body);
    assert!(list.body_params.is_empty());
    assert_eq!(list.query_params.len(), 4);

    let create = descriptor(&descriptors, "postFirewallAliasEndpoint");
    assert!(create.has_request_body);
    assert!(!create.accepts_filters);
    assert!(create.query_params.is_empty());
    assert!(create
        .body_params
        .iter()
        .all(|p| p.location == ParameterLocation::Body));
    assert_eq!(create.body_params.len(), create.parameters.len());

    let graphql = descriptor(&descriptors, "postGraphQLEndpoint");
    assert!(!graphql.accepts_filters);
}

#[test]
fn test_list_response_fields() {
    let descriptors = fixture_descriptors();

    let aliases = descriptor(&descriptors, "getFirewallAliasesEndpoint");
    assert!(aliases.is_list_tool);
    assert_eq!(
        aliases.response_fields.as_deref(),
        Some(&["address", "descr", "detail", "id", "name", "type"].map(String::from)[..])
    );

    let arp = descriptor(&descriptors, "getDiagnosticsARPTableEndpoint");
    assert_eq!(
        arp.response_fields.as_deref(),
        Some(&["interface", "ip_address", "mac_address"].map(String::from)[..])
    );

    // no response schema at all
    let logs = descriptor(&descriptors, "getStatusLogsSystemEndpoint");
    assert!(logs.is_list_tool);
    assert_eq!(logs.response_fields, Some(Vec::new()));

    let single = descriptor(&descriptors, "getFirewallAliasEndpoint");
    assert!(!single.is_list_tool);
    assert_eq!(single.response_fields, None);
}

#[test]
fn test_description_text() {
    let descriptors = fixture_descriptors();

    let create = descriptor(&descriptors, "postFirewallAliasEndpoint");
    assert_eq!(
        create.description,
        "Creates a new Firewall Alias.\n\n\
         Note: After this operation, call `pfsense_firewall_apply` to apply pending changes.\n\n\
         API: POST /api/v2/firewall/alias"
    );

    let bulk = descriptor(&descriptors, "deleteFirewallAliasesEndpoint");
    assert!(bulk.description.contains("Bulk deletion requires at least one filter"));
    assert!(bulk.description.ends_with("API: DELETE /api/v2/firewall/aliases"));

    let single_delete = descriptor(&descriptors, "deleteFirewallAliasEndpoint");
    assert!(!single_delete.description.contains("Bulk deletion"));

    let jwt = descriptor(&descriptors, "postAuthJWTEndpoint");
    assert!(jwt.requires_basic_auth);
    assert!(jwt.description.contains("requires HTTP BasicAuth"));

    let key = descriptor(&descriptors, "postAuthKeyEndpoint");
    assert!(!key.requires_basic_auth);
    assert!(!key.description.contains("BasicAuth"));
}

#[test]
fn test_summary_falls_back_to_method_and_path() {
    let document = inline_document(json!({
        "/api/v2/system/version": {
            "get": { "operationId": "getSystemVersionEndpoint", "responses": {} }
        }
    }));
    let descriptors = build_tool_descriptors(&document, &ClassificationTables::default()).unwrap();
    assert_eq!(descriptors[0].summary, "");
    assert_eq!(
        descriptors[0].description,
        "GET /api/v2/system/version\n\nAPI: GET /api/v2/system/version"
    );
}

#[test]
fn test_unresolvable_list_item_schema_yields_no_fields() {
    let document = inline_document(json!({
        "/api/v2/firewall/widgets": {
            "get": {
                "operationId": "getFirewallWidgetsEndpoint",
                "parameters": [
                    { "name": "limit", "in": "query", "schema": { "type": "integer" } }
                ],
                "responses": {
                    "200": {
                        "description": "ok",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": {
                                        "data": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Missing" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }));
    let descriptors = build_tool_descriptors(&document, &ClassificationTables::default()).unwrap();
    assert_eq!(descriptors.len(), 1);
    assert!(descriptors[0].is_list_tool);
    assert_eq!(descriptors[0].response_fields, Some(Vec::new()));
}

#[test]
fn test_unassigned_module_is_an_error() {
    let document = inline_document(json!({
        "/api/v2/widgets/thing": {
            "get": { "operationId": "getWidgetsThingEndpoint", "responses": {} }
        }
    }));
    let err = build_tool_descriptors(&document, &ClassificationTables::default()).unwrap_err();
    match err {
        GeneratorError::UnassignedModule { operation_id, path } => {
            assert_eq!(operation_id, "getWidgetsThingEndpoint");
            assert_eq!(path, "/api/v2/widgets/thing");
        }
        other => panic!("expected an unassigned module error, got {other}"),
    }
}

#[test]
fn test_duplicate_tool_name_is_an_error() {
    // both identifiers convert to the same name
    let document = inline_document(json!({
        "/api/v2/system/version": {
            "get": { "operationId": "getSystemVersionEndpoint", "responses": {} }
        },
        "/api/v2/system/version_info": {
            "get": { "operationId": "getSystem_VersionEndpoint", "responses": {} }
        }
    }));
    let err = build_tool_descriptors(&document, &ClassificationTables::default()).unwrap_err();
    match err {
        GeneratorError::DuplicateToolName {
            tool_name,
            first,
            second,
        } => {
            assert_eq!(tool_name, "pfsense_get_system_version");
            assert_eq!(first, "getSystemVersionEndpoint");
            assert_eq!(second, "getSystem_VersionEndpoint");
        }
        other => panic!("expected a duplicate name error, got {other}"),
    }
}

#[test]
fn test_mutation_under_apply_subsystem_at_other_root() {
    let tables = ClassificationTables::default().with_api_root("/resource");
    let document = inline_document(json!({
        "/resource/firewall/alias": {
            "post": {
                "operationId": "postFirewallAliasEndpoint",
                "requestBody": { "content": { "application/json": { "schema": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                } } } },
                "responses": {}
            }
        },
        "/resource/firewall/apply": {
            "get": { "operationId": "getFirewallApplyEndpoint", "responses": {} },
            "post": { "operationId": "postFirewallApplyEndpoint", "responses": {} }
        }
    }));

    let descriptors = build_tool_descriptors(&document, &tables).unwrap();
    let names: Vec<&str> = descriptors.iter().map(|d| d.tool_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "pfsense_create_firewall_alias",
            "pfsense_get_firewall_apply_status",
            "pfsense_firewall_apply",
        ]
    );

    let create = &descriptors[0];
    assert!(create.needs_apply);
    assert_eq!(create.apply_tool_name.as_deref(), Some("pfsense_firewall_apply"));
    assert_eq!(create.apply_endpoint.as_deref(), Some("/resource/firewall/apply"));
    assert!(!descriptors[2].needs_apply);
}

#[test]
fn test_plural_collection_paths_assigned() {
    let tables = ClassificationTables::default();
    let builder = ContextBuilder::new(&tables).unwrap();
    assert_eq!(builder.assign_module("/api/v2/interfaces"), Some("interface"));
    assert_eq!(builder.assign_module("/api/v2/interface/vlans"), Some("interface"));
    assert_eq!(builder.assign_module("/api/v2/users"), Some("user"));
}

#[test]
fn test_custom_route_table() {
    let mut tables = ClassificationTables::default();
    tables.module_routes = vec![
        ModuleRoute::new("firewall", "network"),
        ModuleRoute::new("firewall/virtual_ip", "vip"),
    ];
    let builder = ContextBuilder::new(&tables).unwrap();
    assert_eq!(builder.assign_module("/api/v2/firewall/virtual_ip/apply"), Some("vip"));
    assert_eq!(builder.assign_module("/api/v2/firewall/virtual_ips"), Some("network"));
    assert_eq!(builder.assign_module("/api/v2/interface/vlan"), None);
}

#[test]
fn test_invalid_tables_rejected() {
    let mut tables = ClassificationTables::default();
    tables.reserved_suffix.clear();
    assert!(ContextBuilder::new(&tables).is_err());
}

#[test]
fn test_generation_summary() {
    let tables = ClassificationTables::default();
    let descriptors = fixture_descriptors();
    let summary = GenerationSummary::from_descriptors(&descriptors, &tables.module_order());

    assert_eq!(summary.total, 54);
    assert_eq!(summary.reads, 23);
    assert_eq!(summary.mutations, 31);
    assert_eq!(summary.dangerous, 6);
    assert_eq!(summary.needs_apply, 14);
    assert_eq!(summary.list_tools, 11);
    assert_eq!(summary.basic_auth_only, 1);

    let total: usize = summary.modules.iter().map(|m| m.reads + m.writes).sum();
    assert_eq!(total, 54);
    assert_eq!(summary.modules[0].module, "auth");
    assert_eq!(
        descriptors
            .iter()
            .filter(|d| d.method == HttpMethod::Get)
            .count(),
        summary.reads
    );
}
