//! Code Generation
//!
//! Turns declaration manifests into proto3 schema files.
//!
//! Architecture:
//! - CodegenContext: collection (phase 1) then resolution (phase 2); holds
//!   the AliasMap and the MessageRegistry
//! - DependencyGraph + plan_merges: file imports with cycles collapsed
//! - Emitter (`proto`): renders one output unit, never fails
//!
//! All files are rendered in memory before anything is written.

pub mod fields;
pub mod names;
pub mod proto;
pub mod types;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{GeneratorConfig, NamingConfig};
use crate::error::{ProtoGenError, Result};
use crate::graph::{plan_merges, DependencyGraph, MergeMap, MergePlan};
use crate::registry::{MessageRegistry, ProtoMessage};
use crate::schema::{is_exported, DeclKind, SourceFile, TypeExpr};

use self::fields::FieldExtractor;
use self::types::AliasMap;

// =============================================================================
// CodegenContext
// =============================================================================

/// Collected declarations and resolved messages.
///
/// Built in two phases: `collect` registers every alias and message
/// skeleton, `resolve` fills in message fields. Read-only afterwards.
#[derive(Debug)]
pub struct CodegenContext {
    aliases: AliasMap,
    registry: MessageRegistry,
    naming: NamingConfig,
}

impl CodegenContext {
    /// Collect and resolve in one step
    pub fn build(sources: &[SourceFile], naming: &NamingConfig) -> Result<Self> {
        let mut ctx = Self::collect(sources, naming)?;
        ctx.resolve()?;
        Ok(ctx)
    }

    /// Phase 1: record aliases and register message skeletons.
    ///
    /// Declaration names are unique across all kinds and files.
    pub fn collect(sources: &[SourceFile], naming: &NamingConfig) -> Result<Self> {
        let mut aliases = AliasMap::new();
        let mut registry = MessageRegistry::new();
        let mut declared: HashMap<String, String> = HashMap::new();

        for source in sources {
            for decl in &source.declarations {
                let origin = if decl.origin_file.is_empty() {
                    source.file.as_str()
                } else {
                    decl.origin_file.as_str()
                };

                if let Some(first) = declared.get(&decl.name) {
                    return Err(ProtoGenError::NameCollision {
                        name: decl.name.clone(),
                        first: first.clone(),
                        second: origin.to_string(),
                    });
                }
                declared.insert(decl.name.clone(), origin.to_string());

                match decl.kind {
                    DeclKind::Struct => {
                        let message = if is_exported(&decl.name) {
                            ProtoMessage::new(&decl.name, origin, decl.members.clone())
                        } else {
                            debug!(name = %decl.name, file = origin, "registering unexported struct as internal");
                            ProtoMessage::internal(&decl.name, origin, decl.members.clone())
                        };
                        registry.register(message)?;
                    }
                    DeclKind::Alias => {
                        let Some(underlying) = &decl.underlying else {
                            return Err(ProtoGenError::parse_input(
                                origin,
                                format!("alias '{}' has no underlying type", decl.name),
                            ));
                        };
                        aliases.insert(&decl.name, underlying.clone());
                    }
                    DeclKind::Interface => {
                        aliases.insert(&decl.name, TypeExpr::Interface);
                    }
                }
            }
        }

        info!(messages = registry.len(), aliases = aliases.len(), "collected declarations");
        Ok(Self {
            aliases,
            registry,
            naming: naming.clone(),
        })
    }

    /// Phase 2: resolve every message's fields
    pub fn resolve(&mut self) -> Result<()> {
        let extractor = FieldExtractor::new(&self.aliases, &self.naming);
        self.registry.resolve_all(&extractor)
    }

    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Number of messages that will be emitted
    pub fn message_count(&self) -> usize {
        self.registry.emitted().count()
    }

    /// File dependency graph of the resolved messages
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(&self.registry)
    }
}

// =============================================================================
// Generated Output
// =============================================================================

/// One rendered schema file
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Host file the unit is named after
    pub source_file: String,
    /// Path relative to the output directory
    pub path: PathBuf,
    /// Schema text
    pub content: String,
    /// Number of messages in the file
    pub message_count: usize,
}

/// Output from schema generation
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Rendered files, sorted by source file
    pub files: Vec<GeneratedFile>,
    /// Total number of messages generated
    pub message_count: usize,
    /// Files folded into another file to break import cycles
    pub merge_map: MergeMap,
}

// =============================================================================
// Public API
// =============================================================================

/// Plan output units for loaded sources
pub fn plan(sources: &[SourceFile], config: &GeneratorConfig) -> Result<(CodegenContext, MergePlan)> {
    let ctx = CodegenContext::build(sources, &config.naming)?;
    let graph = ctx.dependency_graph();
    let plan = plan_merges(&graph, config.merge.target);
    Ok((ctx, plan))
}

/// Generate schema text for every output unit
pub fn generate(sources: &[SourceFile], config: &GeneratorConfig) -> Result<GeneratedOutput> {
    let (ctx, plan) = plan(sources, config)?;

    let files: Vec<GeneratedFile> = plan
        .units
        .iter()
        .map(|unit| GeneratedFile {
            source_file: unit.file.clone(),
            path: PathBuf::from(config.output.schema_file_name(&unit.file)),
            content: proto::emit_unit(unit, ctx.registry(), &config.output),
            message_count: unit.messages.len(),
        })
        .collect();

    info!(
        files = files.len(),
        messages = ctx.message_count(),
        merged = plan.merge_map.len(),
        "generated schemas"
    );

    Ok(GeneratedOutput {
        files,
        message_count: ctx.message_count(),
        merge_map: plan.merge_map,
    })
}

/// Write generated files under `dir`, creating directories as needed.
///
/// Stops at the first failed write.
pub fn write_output(output: &GeneratedOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(output.files.len());

    for file in &output.files {
        let path = dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ProtoGenError::OutputWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &file.content).map_err(|source| ProtoGenError::OutputWrite {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), messages = file.message_count, "wrote schema");
        written.push(path);
    }

    info!(files = written.len(), dir = %dir.display(), "wrote output");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Declaration, Member};

    fn source(file: &str, declarations: Vec<Declaration>) -> SourceFile {
        SourceFile {
            file: file.to_string(),
            declarations,
        }
    }

    #[test]
    fn test_collect_registers_unexported_structs_as_internal() {
        let sources = vec![source(
            "x.go",
            vec![
                Declaration::structure("Public", "x.go", vec![]),
                Declaration::structure("private", "x.go", vec![]),
                Declaration::alias("ID", "x.go", TypeExpr::ident("string")),
                Declaration::interface("Shape", "x.go"),
            ],
        )];

        let ctx = CodegenContext::collect(&sources, &NamingConfig::default()).unwrap();
        assert_eq!(ctx.message_count(), 1);
        assert_eq!(ctx.registry().len(), 2);
        assert!(ctx.registry().get("Public").unwrap().is_emitted());
        assert!(!ctx.registry().get("private").unwrap().is_emitted());
        assert!(ctx.aliases().contains("ID"));
        assert_eq!(ctx.aliases().get("Shape"), Some(&TypeExpr::Interface));
    }

    #[test]
    fn test_collision_between_alias_and_struct() {
        let sources = vec![
            source("a.go", vec![Declaration::alias("Token", "a.go", TypeExpr::ident("string"))]),
            source("b.go", vec![Declaration::structure("Token", "b.go", vec![])]),
        ];

        let err = CodegenContext::collect(&sources, &NamingConfig::default()).unwrap_err();
        match err {
            ProtoGenError::NameCollision { name, first, second } => {
                assert_eq!(name, "Token");
                assert_eq!(first, "a.go");
                assert_eq!(second, "b.go");
            }
            other => panic!("Expected NameCollision, got {:?}", other),
        }
    }

    #[test]
    fn test_alias_without_underlying() {
        let mut decl = Declaration::alias("Broken", "a.go", TypeExpr::ident("string"));
        decl.underlying = None;
        let err = CodegenContext::collect(&[source("a.go", vec![decl])], &NamingConfig::default()).unwrap_err();
        assert!(matches!(err, ProtoGenError::ParseInput { .. }));
    }

    #[test]
    fn test_interface_field_becomes_any() {
        let sources = vec![source(
            "x.go",
            vec![
                Declaration::interface("Shape", "x.go"),
                Declaration::structure("Canvas", "x.go", vec![Member::named(["Shapes"], TypeExpr::slice(TypeExpr::ident("Shape")))]),
            ],
        )];

        let output = generate(&sources, &GeneratorConfig::default()).unwrap();
        assert_eq!(output.files.len(), 1);
        assert!(output.files[0].content.contains("  repeated google.protobuf.Any shapes = 1;\n"));
    }

    #[test]
    fn test_generate_names_files_after_units() {
        let sources = vec![
            source("c.go", vec![Declaration::structure("C", "c.go", vec![Member::named(["D"], TypeExpr::pointer(TypeExpr::ident("D")))])]),
            source("d.go", vec![Declaration::structure("D", "d.go", vec![Member::named(["C"], TypeExpr::pointer(TypeExpr::ident("C")))])]),
            source("e.go", vec![Declaration::structure("E", "e.go", vec![Member::named(["Name"], TypeExpr::ident("string"))])]),
        ];

        let output = generate(&sources, &GeneratorConfig::default()).unwrap();
        let paths: Vec<_> = output.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("c.proto"), PathBuf::from("e.proto")]);
        assert_eq!(output.message_count, 3);
        assert_eq!(output.merge_map.get("d.go"), Some("c.go"));
        assert_eq!(output.files[0].message_count, 2);
    }

    #[test]
    fn test_embedded_unexported_struct_is_spliced_not_emitted() {
        let sources = vec![source(
            "user.go",
            vec![
                Declaration::structure("base", "user.go", vec![Member::named(["ID"], TypeExpr::ident("string"))]),
                Declaration::structure(
                    "User",
                    "user.go",
                    vec![Member::embedded(TypeExpr::ident("base")), Member::named(["Name"], TypeExpr::ident("string"))],
                ),
            ],
        )];

        let output = generate(&sources, &GeneratorConfig::default()).unwrap();
        assert_eq!(output.message_count, 1);
        let content = &output.files[0].content;
        assert!(content.contains("message User {\n  string id = 1;\n  string name = 2;\n}\n"));
        assert!(!content.contains("message base"));
    }

    #[test]
    fn test_generate_fails_without_partial_output() {
        let sources = vec![source(
            "x.go",
            vec![Declaration::structure("Order", "x.go", vec![Member::named(["Buyer"], TypeExpr::ident("Missing"))])],
        )];

        let err = generate(&sources, &GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, ProtoGenError::UnknownMessage { .. }));
    }
}
