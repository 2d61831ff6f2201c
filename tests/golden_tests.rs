//! Golden Tests for Proto Generation
//!
//! Runs the full pipeline (load -> resolve -> merge -> emit -> write) over the
//! JSON manifests in `tests/fixtures`.

use std::fs;
use std::path::{Path, PathBuf};

use struct_proto::codegen::{self, CodegenContext};
use struct_proto::config::{GeneratorConfig, MergeTarget, WellKnownImports};
use struct_proto::graph::plan_merges;
use struct_proto::loader::{self, LoadConfig};
use struct_proto::{GeneratedOutput, ProtoGenError, SourceFile};
use tempfile::TempDir;

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

fn load(fixture: &str) -> Vec<SourceFile> {
    loader::load_sources(&[fixtures_path().join(fixture)], &LoadConfig::default()).unwrap()
}

fn config(base: &str) -> GeneratorConfig {
    let mut config = GeneratorConfig::default();
    config.output.base_dir = base.to_string();
    config
}

fn file<'a>(output: &'a GeneratedOutput, name: &str) -> &'a str {
    output
        .files
        .iter()
        .find(|f| f.path == PathBuf::from(name))
        .map(|f| f.content.as_str())
        .unwrap_or_else(|| panic!("{} not generated", name))
}

// =============================================================================
// End-to-End Cases
// =============================================================================

#[test]
fn test_same_file_reference_matches_golden() {
    let output = codegen::generate(&load("same_file"), &config("github.com/acme/model")).unwrap();

    assert_eq!(output.files.len(), 1);
    assert!(output.merge_map.is_empty());

    let expected = include_str!("fixtures/golden/same_file.proto");
    assert_eq!(file(&output, "x.proto"), expected);
}

#[test]
fn test_cyclic_files_merge_into_one() {
    let output = codegen::generate(&load("cycle"), &config("github.com/acme/graph")).unwrap();

    assert_eq!(output.files.len(), 1);
    assert_eq!(output.merge_map.get("d.go"), Some("c.go"));

    let content = file(&output, "c.proto");
    assert!(content.contains("message C {\n  string name = 1;\n  optional D peer = 2;\n}\n"));
    assert!(content.contains("message D {\n  repeated C owners = 1;\n}\n"));
    // no import between the merged files, nor of the merged file itself
    assert!(!content.contains("graph/c.proto"));
    assert!(!content.contains("graph/d.proto"));
}

#[test]
fn test_cyclic_files_merge_largest() {
    let mut config = config("github.com/acme/graph");
    config.merge.target = MergeTarget::Largest;
    let output = codegen::generate(&load("cycle"), &config).unwrap();

    assert_eq!(output.files.len(), 1);
    assert_eq!(output.files[0].path, PathBuf::from("d.proto"));
    assert_eq!(output.merge_map.get("c.go"), Some("d.go"));
}

// =============================================================================
// Multi-File Project
// =============================================================================

#[test]
fn test_shop_user_message() {
    let output = codegen::generate(&load("shop"), &config("github.com/acme/shop")).unwrap();
    let user = file(&output, "user.proto");

    let expected = "\
message User {
  string id = 1;
  string email = 2;
  repeated string labels = 3;
  bytes avatar = 4;
  google.protobuf.Timestamp created_at = 5;
  google.protobuf.Timestamp updated_at = 6;
  google.protobuf.Duration ttl = 7;
  uint32 note = 8;
}
";
    assert!(user.contains(expected), "unexpected user.proto:\n{}", user);
    // embedding splices fields; it does not import the embedded file
    assert!(!user.contains("shop/common.proto"));
}

#[test]
fn test_shop_order_message_and_imports() {
    let output = codegen::generate(&load("shop"), &config("github.com/acme/shop")).unwrap();
    let order = file(&output, "order.proto");

    assert!(order.contains("package shop;\n"));
    assert!(order.contains("option go_package = \"github.com/acme/shop\";\n"));
    assert!(order.contains("import \"shop/user.proto\";\n"));

    let expected = "\
message Order {
  string order_id = 1;
  optional User buyer = 2;
  repeated LineItem lines = 3;
  map<string, double> attributes = 4;
  google.protobuf.Any extra = 5;
  google.protobuf.Any callback = 6;
  decimal.Decimal total = 7;
}

message LineItem {
  string sku = 1;
  int32 quantity = 2;
  string http_ref = 3;
}
";
    assert!(order.contains(expected), "unexpected order.proto:\n{}", order);
}

#[test]
fn test_shop_unexported_struct_is_not_emitted() {
    let output = codegen::generate(&load("shop"), &config("github.com/acme/shop")).unwrap();
    let common = file(&output, "common.proto");

    assert!(common.contains("message Audit {"));
    assert!(!common.contains("message cache"));
    assert_eq!(output.message_count, 4);
}

#[test]
fn test_shop_used_imports_only() {
    let mut config = config("github.com/acme/shop");
    config.output.well_known_imports = WellKnownImports::Used;
    let output = codegen::generate(&load("shop"), &config).unwrap();

    let user = file(&output, "user.proto");
    assert!(!user.contains("google/protobuf/any.proto"));
    assert!(user.contains("google/protobuf/duration.proto"));
    assert!(user.contains("google/protobuf/timestamp.proto"));

    let order = file(&output, "order.proto");
    assert!(order.contains("google/protobuf/any.proto"));
    assert!(!order.contains("google/protobuf/timestamp.proto"));
}

#[test]
fn test_merged_graph_is_acyclic() {
    let sources: Vec<SourceFile> = load("shop").into_iter().chain(load("cycle")).collect();
    let ctx = CodegenContext::build(&sources, &Default::default()).unwrap();
    let graph = ctx.dependency_graph();
    assert!(graph.is_cyclic());

    let plan = plan_merges(&graph, MergeTarget::Smallest);
    let files: Vec<_> = plan.units.iter().map(|u| u.file.as_str()).collect();
    assert_eq!(files, vec!["c.go", "common.go", "order.go", "user.go"]);
    assert_eq!(plan.unit("order.go").unwrap().imports, vec!["user.go"]);
}

// =============================================================================
// Writing
// =============================================================================

#[test]
fn test_write_output_creates_directory() {
    let output = codegen::generate(&load("shop"), &config("github.com/acme/shop")).unwrap();
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("gen/proto");

    let written = codegen::write_output(&output, &out_dir).unwrap();
    assert_eq!(written.len(), 3);
    for name in ["common.proto", "order.proto", "user.proto"] {
        let content = fs::read_to_string(out_dir.join(name)).unwrap();
        assert!(content.starts_with("/* Code generated by struct-proto. DO NOT EDIT. */"));
    }
}

#[test]
fn test_write_output_reports_failure() {
    let output = codegen::generate(&load("same_file"), &config("m")).unwrap();
    let dir = TempDir::new().unwrap();
    // a regular file where the output directory should be
    let blocker = dir.path().join("out");
    fs::write(&blocker, "").unwrap();

    let err = codegen::write_output(&output, &blocker).unwrap_err();
    assert!(matches!(err, ProtoGenError::OutputWrite { .. }));
}

#[test]
fn test_unknown_reference_fails_whole_run() {
    let sources: Vec<SourceFile> = serde_json::from_str(
        r#"[{
            "file": "bad.go",
            "declarations": [
                {"name": "Good", "kind": "struct", "members": []},
                {"name": "Bad", "kind": "struct", "members": [
                    {"names": ["Ref"], "type": {"kind": "ident", "name": "Nowhere"}}
                ]}
            ]
        }]"#,
    )
    .unwrap();

    let err = codegen::generate(&sources, &config("m")).unwrap_err();
    assert_eq!(err.to_string(), "Unknown message 'Nowhere' referenced by 'Bad.Ref'");
}

#[test]
fn test_alias_cycle_reported() {
    let sources: Vec<SourceFile> = serde_json::from_str(
        r#"[{
            "file": "loop.go",
            "declarations": [
                {"name": "A", "kind": "alias", "underlying": {"kind": "ident", "name": "B"}},
                {"name": "B", "kind": "alias", "underlying": {"kind": "ident", "name": "A"}},
                {"name": "Holder", "kind": "struct", "members": [
                    {"names": ["Value"], "type": {"kind": "ident", "name": "A"}}
                ]}
            ]
        }]"#,
    )
    .unwrap();

    let err = codegen::generate(&sources, &config("m")).unwrap_err();
    match err {
        ProtoGenError::AliasCycle { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
        other => panic!("Expected AliasCycle, got {:?}", other),
    }
}
