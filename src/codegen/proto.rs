//! Proto3 Schema Emitter
//!
//! Renders one `OutputUnit` into schema text. Pure rendering: every type,
//! name and import is already decided by the time a unit gets here.
//!
//! Layout:
//! - Banner comment
//! - `syntax`, `package` and the base-path `option`
//! - Well-known imports, then cross-file imports
//! - One `message` block per message, fields numbered from 1

use std::collections::BTreeSet;

use crate::config::{OutputConfig, WellKnownImports};
use crate::graph::OutputUnit;
use crate::registry::{MessageRegistry, ProtoField, ProtoMessage};

use super::types::WellKnownType;

// =============================================================================
// Public API
// =============================================================================

/// Emit the schema text for an output unit
pub fn emit_unit(unit: &OutputUnit, registry: &MessageRegistry, config: &OutputConfig) -> String {
    let messages: Vec<&ProtoMessage> = unit.messages.iter().filter_map(|name| registry.get(name)).collect();

    let mut output = String::new();
    emit_header(&mut output, config);
    emit_imports(&mut output, unit, &messages, config);

    for message in messages {
        emit_message(&mut output, message);
    }

    output
}

// =============================================================================
// Header Emission
// =============================================================================

fn emit_header(output: &mut String, config: &OutputConfig) {
    if !config.banner.is_empty() {
        output.push_str(&format!("/* {} */\n\n", config.banner));
    }
    output.push_str("syntax = \"proto3\";\n\n");
    output.push_str(&format!("package {};\n\n", config.package_name()));
    output.push_str(&format!("option {} = \"{}\";\n\n", config.option_name, config.base_dir));
}

fn emit_imports(output: &mut String, unit: &OutputUnit, messages: &[&ProtoMessage], config: &OutputConfig) {
    let well_known: Vec<WellKnownType> = match config.well_known_imports {
        WellKnownImports::Always => WellKnownType::ALL.to_vec(),
        WellKnownImports::Used => {
            let used: BTreeSet<WellKnownType> = messages
                .iter()
                .flat_map(|m| m.fields())
                .flat_map(|f| f.schema_type.well_known_types())
                .collect();
            used.into_iter().collect()
        }
    };

    for wkt in &well_known {
        output.push_str(&format!("import \"{}\";\n", wkt.import_path()));
    }

    for import in &unit.imports {
        output.push_str(&format!("import \"{}\";\n", import_path(import, config)));
    }

    if !well_known.is_empty() || !unit.imports.is_empty() {
        output.push('\n');
    }
}

/// Import path of another unit: `<package>/<file>.proto`, or just the file
/// name when no base directory is set
pub fn import_path(file: &str, config: &OutputConfig) -> String {
    let schema_file = config.schema_file_name(file);
    if config.base_dir.is_empty() {
        schema_file
    } else {
        format!("{}/{}", config.package_name(), schema_file)
    }
}

// =============================================================================
// Message Emission
// =============================================================================

fn emit_message(output: &mut String, message: &ProtoMessage) {
    output.push_str(&format!("message {} {{\n", message.name));
    for (index, field) in message.fields().iter().enumerate() {
        output.push_str(&format!("  {} = {};\n", field_decl(field), index + 1));
    }
    output.push_str("}\n\n");
}

fn field_decl(field: &ProtoField) -> String {
    match field.cardinality.label() {
        Some(label) => format!("{} {} {}", label, field.schema_type, field.wire_name),
        None => format!("{} {}", field.schema_type, field.wire_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::fields::FieldExtractor;
    use crate::codegen::types::AliasMap;
    use crate::config::NamingConfig;
    use crate::schema::{Member, TypeExpr};

    fn registry_of(messages: Vec<ProtoMessage>) -> MessageRegistry {
        let aliases = AliasMap::new();
        let naming = NamingConfig::default();
        let extractor = FieldExtractor::new(&aliases, &naming);
        let mut registry = MessageRegistry::new();
        for message in messages {
            registry.register(message).unwrap();
        }
        registry.resolve_all(&extractor).unwrap();
        registry
    }

    fn unit(file: &str, messages: &[&str], imports: &[&str]) -> OutputUnit {
        OutputUnit {
            file: file.to_string(),
            messages: messages.iter().map(|m| m.to_string()).collect(),
            imports: imports.iter().map(|i| i.to_string()).collect(),
        }
    }

    fn config(base: &str) -> OutputConfig {
        OutputConfig {
            base_dir: base.to_string(),
            ..OutputConfig::default()
        }
    }

    #[test]
    fn test_emit_full_file() {
        let registry = registry_of(vec![
            ProtoMessage::new("A", "x.go", vec![Member::named(["X"], TypeExpr::ident("int"))]),
            ProtoMessage::new("B", "x.go", vec![Member::named(["Y"], TypeExpr::pointer(TypeExpr::ident("A")))]),
        ]);

        let text = emit_unit(&unit("x.go", &["A", "B"], &[]), &registry, &config("github.com/acme/model"));
        let expected = "\
/* Code generated by struct-proto. DO NOT EDIT. */

syntax = \"proto3\";

package model;

option go_package = \"github.com/acme/model\";

import \"google/protobuf/any.proto\";
import \"google/protobuf/duration.proto\";
import \"google/protobuf/timestamp.proto\";

message A {
  int64 x = 1;
}

message B {
  optional A y = 1;
}

";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_cross_file_imports() {
        let registry = registry_of(vec![
            ProtoMessage::new("User", "user.go", vec![]),
            ProtoMessage::new("Order", "order.go", vec![Member::named(["Buyer"], TypeExpr::ident("User"))]),
        ]);

        let text = emit_unit(&unit("order.go", &["Order"], &["user.go"]), &registry, &config("pkg/shop"));
        assert!(text.contains("import \"google/protobuf/timestamp.proto\";\nimport \"shop/user.proto\";\n\n"));
        assert!(text.contains("  User buyer = 1;\n"));
    }

    #[test]
    fn test_import_path_without_base() {
        assert_eq!(import_path("user.go", &config("")), "user.proto");
        assert_eq!(import_path("user.go", &config("a/b")), "b/user.proto");
    }

    #[test]
    fn test_used_well_known_imports_only() {
        let registry = registry_of(vec![ProtoMessage::new(
            "Event",
            "event.go",
            vec![
                Member::named(["At"], TypeExpr::qualified("time", "Time")),
                Member::named(["Name"], TypeExpr::ident("string")),
            ],
        )]);

        let mut cfg = config("events");
        cfg.well_known_imports = WellKnownImports::Used;
        let text = emit_unit(&unit("event.go", &["Event"], &[]), &registry, &cfg);

        assert!(text.contains("import \"google/protobuf/timestamp.proto\";"));
        assert!(!text.contains("any.proto"));
        assert!(!text.contains("duration.proto"));
        assert!(text.contains("  google.protobuf.Timestamp at = 1;\n"));
    }

    #[test]
    fn test_labels_and_dense_numbering() {
        let registry = registry_of(vec![ProtoMessage::new(
            "Bag",
            "bag.go",
            vec![
                Member::named(["Items"], TypeExpr::slice(TypeExpr::ident("string"))),
                Member::named(["hidden"], TypeExpr::ident("int")),
                Member::named(["Skip"], TypeExpr::ident("int")).with_tag(r#"json:"-""#),
                Member::named(["Counts"], TypeExpr::map(TypeExpr::ident("string"), TypeExpr::ident("int"))),
                Member::named(["Note"], TypeExpr::pointer(TypeExpr::ident("string"))),
            ],
        )]);

        let text = emit_unit(&unit("bag.go", &["Bag"], &[]), &registry, &config("bags"));
        assert!(text.contains(
            "message Bag {\n  repeated string items = 1;\n  map<string, int64> counts = 2;\n  optional string note = 3;\n}\n"
        ));
    }

    #[test]
    fn test_empty_banner_is_omitted() {
        let registry = registry_of(vec![ProtoMessage::new("Empty", "e.go", vec![])]);
        let mut cfg = config("e");
        cfg.banner = String::new();
        let text = emit_unit(&unit("e.go", &["Empty"], &[]), &registry, &cfg);
        assert!(text.starts_with("syntax = \"proto3\";"));
        assert!(text.ends_with("message Empty {\n}\n\n"));
    }
}
