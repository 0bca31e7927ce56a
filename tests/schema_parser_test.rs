//! Tests for parameter extraction against the sample pfSense document

use pfsense_toolgen::config::ClassificationTables;
use pfsense_toolgen::generator::{
    Operation, ParamType, ParameterExtractor, ParameterLocation, SpecDocument, ToolParameter,
};
use serde_json::json;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/pfsense_openapi_sample.json"
);

struct Fixture {
    document: SpecDocument,
    operations: Vec<Operation>,
    extractor: ParameterExtractor,
}

impl Fixture {
    fn load() -> Self {
        let document = SpecDocument::from_file(FIXTURE).unwrap();
        let operations = document.parse_operations().unwrap();
        Self {
            document,
            operations,
            extractor: ParameterExtractor::new(&ClassificationTables::default()),
        }
    }

    fn params(&self, operation_id: &str) -> Vec<ToolParameter> {
        let operation = self
            .operations
            .iter()
            .find(|op| op.operation_id == operation_id)
            .unwrap_or_else(|| panic!("no operation {}", operation_id));
        self.extractor.extract(&self.document, operation).unwrap()
    }
}

fn names(params: &[ToolParameter]) -> Vec<&str> {
    params.iter().map(|p| p.name.as_str()).collect()
}

fn find<'a>(params: &'a [ToolParameter], name: &str) -> &'a ToolParameter {
    params
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("no parameter {}", name))
}

#[test]
fn test_required_first_then_alphabetical() {
    let fixture = Fixture::load();
    let params = fixture.params("postRoutingGatewayEndpoint");
    assert_eq!(
        names(&params),
        vec!["gateway", "interface", "ipprotocol", "name", "latencylow", "weight"]
    );
}

#[test]
fn test_reserved_words_renamed() {
    let fixture = Fixture::load();

    let vlan = fixture.params("postInterfaceVLANEndpoint");
    assert_eq!(names(&vlan), vec!["if_", "tag", "descr", "pcp"]);
    let parent = find(&vlan, "if_");
    assert_eq!(parent.api_name, "if");
    assert!(parent.is_renamed());
    assert!(parent.required);
    assert_eq!(parent.description, "The parent interface.");

    let alias = fixture.params("postFirewallAliasEndpoint");
    let alias_type = find(&alias, "type_");
    assert_eq!(alias_type.api_name, "type");
    assert_eq!(alias_type.description, "Sets the type of alias.");
    assert_eq!(
        alias_type.enum_values,
        Some(vec![json!("host"), json!("network"), json!("port")])
    );

    let phase1 = fixture.params("postVPNIPsecPhase1Endpoint");
    let class = find(&phase1, "class_");
    assert_eq!(class.api_name, "class");
    assert_eq!(class.default, Some(json!("default")));
}

#[test]
fn test_read_only_properties_skipped() {
    let fixture = Fixture::load();

    let alias = fixture.params("postFirewallAliasEndpoint");
    assert!(alias.iter().all(|p| p.api_name != "id"));

    let vlan = fixture.params("postInterfaceVLANEndpoint");
    assert!(vlan.iter().all(|p| p.api_name != "vlanif"));

    let user = fixture.params("postUserEndpoint");
    assert!(user.iter().all(|p| p.api_name != "uid" && p.api_name != "scope"));
    assert!(find(&user, "password").required);

    let backend = fixture.params("postServicesHAProxyBackendEndpoint");
    assert!(backend.iter().all(|p| p.api_name != "servers"));
}

#[test]
fn test_sentinel_defaults_dropped() {
    let fixture = Fixture::load();

    let dhcp = fixture.params("patchServicesDHCPServerEndpoint");
    assert_eq!(find(&dhcp, "maxleasetime").default, None);
    assert_eq!(find(&dhcp, "defaultleasetime").default, Some(json!(7200)));
    assert_eq!(find(&dhcp, "enable").default, Some(json!(true)));

    let haproxy = fixture.params("patchServicesHAProxySettingsEndpoint");
    assert_eq!(find(&haproxy, "maxconn").default, None);
    assert_eq!(find(&haproxy, "nbthread").default, Some(json!(1)));
}

#[test]
fn test_conditional_default_cleared() {
    let fixture = Fixture::load();
    let params = fixture.params("postFirewallVirtualIPEndpoint");

    let vhid = find(&params, "vhid");
    assert_eq!(vhid.default, None);
    assert!(vhid.description.starts_with("The VHID group. This field"));
    assert!(!vhid.description.contains("<br>"));

    assert_eq!(find(&params, "subnet_bits").default, Some(json!(32)));
    assert_eq!(find(&params, "password").default, None);
    assert_eq!(names(&params)[..3], ["interface", "mode", "subnet"]);
}

#[test]
fn test_catch_all_filter_map() {
    let fixture = Fixture::load();
    let params = fixture.params("getFirewallAliasesEndpoint");
    assert_eq!(names(&params), vec!["limit", "offset", "query", "sort_order"]);

    let query = find(&params, "query");
    assert!(query.filter_map);
    assert_eq!(query.param_type, ParamType::Object);
    assert_eq!(query.location, ParameterLocation::Query);
    assert!(!query.required);

    let limit = find(&params, "limit");
    assert!(!limit.filter_map);
    assert_eq!(limit.param_type, ParamType::Integer);
    assert_eq!(limit.default, Some(json!(0)));

    let sort_order = find(&params, "sort_order");
    assert_eq!(
        sort_order.enum_values,
        Some(vec![json!("SORT_ASC"), json!("SORT_DESC")])
    );
}

#[test]
fn test_body_field_named_query_is_not_a_filter() {
    let fixture = Fixture::load();
    let params = fixture.params("postGraphQLEndpoint");
    assert_eq!(names(&params), vec!["query", "variables"]);

    let query = find(&params, "query");
    assert!(!query.filter_map);
    assert!(query.required);
    assert_eq!(query.location, ParameterLocation::Body);
    assert_eq!(query.param_type, ParamType::String);
    assert_eq!(find(&params, "variables").param_type, ParamType::Object);
}

#[test]
fn test_array_body_becomes_items_parameter() {
    let fixture = Fixture::load();
    let params = fixture.params("putFirewallAliasesEndpoint");
    assert_eq!(params.len(), 1);

    let items = &params[0];
    assert_eq!(items.name, "items");
    assert!(items.required);
    assert_eq!(items.location, ParameterLocation::Body);
    assert_eq!(items.param_type, ParamType::Array(Box::new(ParamType::Object)));
    assert_eq!(items.param_type.to_string(), "array<object>");
}

#[test]
fn test_union_types() {
    let fixture = Fixture::load();

    let get = fixture.params("getFirewallAliasEndpoint");
    let id = find(&get, "id");
    assert_eq!(id.param_type, ParamType::StringOrInteger);
    assert_eq!(id.param_type.to_string(), "string|integer");
    assert_eq!(id.description, "The ID of the object to target.");

    let backend = fixture.params("postServicesHAProxyBackendEndpoint");
    assert_eq!(find(&backend, "retries").param_type, ParamType::StringOrInteger);
}

#[test]
fn test_enum_with_empty_member_and_default() {
    let fixture = Fixture::load();
    let backend = fixture.params("postServicesHAProxyBackendEndpoint");
    let balance = find(&backend, "balance");
    assert_eq!(balance.default, Some(json!("")));
    let values = balance.enum_values.as_ref().unwrap();
    assert_eq!(values.first(), Some(&json!("")));
    assert_eq!(values.len(), 6);
}

#[test]
fn test_array_property_types() {
    let fixture = Fixture::load();
    let dhcp = fixture.params("patchServicesDHCPServerEndpoint");
    assert_eq!(
        find(&dhcp, "dnsserver").param_type,
        ParamType::Array(Box::new(ParamType::String))
    );
}

#[test]
fn test_delete_reads_no_body() {
    let fixture = Fixture::load();
    let params = fixture.params("deleteFirewallAliasEndpoint");
    assert_eq!(names(&params), vec!["id", "apply"]);
    assert!(params.iter().all(|p| p.location == ParameterLocation::Query));

    let apply = find(&params, "apply");
    assert_eq!(apply.param_type, ParamType::Boolean);
    assert_eq!(apply.default, Some(json!(false)));
}

#[test]
fn test_optional_body() {
    let fixture = Fixture::load();
    let params = fixture.params("postAuthKeyEndpoint");
    assert_eq!(names(&params), vec!["descr"]);
    assert!(!params[0].required);

    let apply = fixture.params("postFirewallApplyEndpoint");
    assert!(apply.is_empty());
}

#[test]
fn test_patch_merges_all_of_members() {
    let fixture = Fixture::load();
    let params = fixture.params("patchFirewallAliasEndpoint");
    let name = find(&params, "name");
    assert!(name.required);
    assert_eq!(name.description, "Renames the alias.");
    assert!(find(&params, "type_").required);
    assert!(!find(&params, "descr").required);
}
