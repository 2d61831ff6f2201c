//! Struct to Proto3 Schema Generator
//!
//! Translates struct declarations from a statically typed host language into
//! proto3 schema files, keeping field names, types, cardinality and
//! cross-file references intact.
//!
//! ## Pipeline
//!
//! ```text
//! manifests (JSON) ──► loader ──► collection ──► resolution ──► file graph ──► cycle merge ──► emit
//!                                 AliasMap        FieldExtractor  DependencyGraph  MergePlan     .proto
//!                                 MessageRegistry TypeResolver
//! ```
//!
//! Declarations come from an external parser as one JSON manifest per host
//! file (see [`schema::SourceFile`]).
//!
//! ## Example
//!
//! ```no_run
//! use struct_proto::{codegen, loader, GeneratorConfig};
//!
//! let config = GeneratorConfig::load()?;
//! let sources = loader::load_sources(&config.input.paths, &loader::LoadConfig::default())?;
//! let output = codegen::generate(&sources, &config)?;
//! codegen::write_output(&output, &config.output.dir)?;
//! # Ok::<(), struct_proto::ProtoGenError>(())
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod registry;
pub mod schema;

pub use codegen::{generate, write_output, CodegenContext, GeneratedFile, GeneratedOutput};
pub use config::GeneratorConfig;
pub use error::{ProtoGenError, Result};
pub use graph::{DependencyGraph, MergeMap, MergePlan, OutputUnit};
pub use registry::{MessageRegistry, ProtoField, ProtoMessage};
pub use schema::{Declaration, Member, SourceFile, TypeExpr};
