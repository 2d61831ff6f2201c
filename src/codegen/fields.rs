//! Field Extraction
//!
//! Turns one struct's member list into an ordered list of proto fields:
//! - Unexported members are dropped
//! - Tags rename or exclude fields
//! - Embedded structs are flattened in place, with direct fields shadowing
//!   promoted ones of the same name
//! - Internal (unexported) structs can be embedded; a field typed as one
//!   becomes `google.protobuf.Any` since the message is never emitted

use std::collections::HashSet;

use tracing::trace;

use super::names::{parse_tag, wire_name, TagName};
use super::types::{AliasMap, SchemaType, TypeResolver};
use crate::config::NamingConfig;
use crate::error::{ProtoGenError, Result};
use crate::registry::{MessageRegistry, ProtoField};
use crate::schema::{is_exported, Member, TypeExpr};

/// Extracts fields from struct members
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'a> {
    resolver: TypeResolver<'a>,
    tag_key: Option<&'a str>,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(aliases: &'a AliasMap, naming: &'a NamingConfig) -> Self {
        Self {
            resolver: TypeResolver::new(aliases),
            tag_key: naming.tag_key.as_deref(),
        }
    }

    /// Extract the fields of `message` from its members.
    ///
    /// Embedded messages are resolved through `registry`, which guards
    /// against embedding cycles.
    pub fn extract(
        &self,
        message: &str,
        members: &[Member],
        registry: &mut MessageRegistry,
    ) -> Result<Vec<ProtoField>> {
        // Shadow set: every name declared directly on this message
        let direct: HashSet<&str> = members
            .iter()
            .flat_map(|m| m.names.iter().map(String::as_str))
            .collect();

        let mut fields: Vec<ProtoField> = Vec::new();
        let mut extracted: HashSet<String> = HashSet::new();

        for member in members {
            if member.is_embedded() {
                if parse_tag(member.tag.as_deref(), self.tag_key) == TagName::Skip {
                    trace!(owner = %message, embedded = %member.ty, "embedded member excluded by tag");
                    continue;
                }

                let embedded = self.embedded_message(message, &member.ty)?;
                let promoted = registry.resolve(&embedded, self)?;
                for field in promoted.fields() {
                    if direct.contains(field.name.as_str()) {
                        trace!(owner = %message, field = %field.name, from = %embedded, "promoted field shadowed");
                        continue;
                    }
                    if extracted.insert(field.name.clone()) {
                        fields.push(field.clone());
                    }
                }
                continue;
            }

            for name in &member.names {
                if !is_exported(name) {
                    continue;
                }
                let Some(wire_name) = wire_name(name, member.tag.as_deref(), self.tag_key) else {
                    trace!(owner = %message, field = %name, "field excluded by tag");
                    continue;
                };

                let mut resolved = self.resolver.resolve(&member.ty)?;
                for referenced in resolved.schema_type.message_refs() {
                    if !registry.contains(referenced) {
                        return Err(ProtoGenError::UnknownMessage {
                            name: referenced.to_string(),
                            referenced_by: format!("{}.{}", message, name),
                        });
                    }
                }
                if has_internal_ref(&resolved.schema_type, registry) {
                    trace!(owner = %message, field = %name, "field references an internal message, using Any");
                    resolved.schema_type = replace_internal(resolved.schema_type, registry);
                }

                extracted.insert(name.clone());
                fields.push(ProtoField {
                    name: name.clone(),
                    schema_type: resolved.schema_type,
                    cardinality: resolved.cardinality,
                    wire_name,
                });
            }
        }

        Ok(fields)
    }

    /// Name of the message an embedded member refers to
    fn embedded_message(&self, message: &str, ty: &TypeExpr) -> Result<String> {
        match self.resolver.resolve(ty)?.schema_type {
            SchemaType::Message(name) => Ok(name),
            other => Err(ProtoGenError::UnknownMessage {
                name: other.to_string(),
                referenced_by: format!("{} (embedded {})", message, ty),
            }),
        }
    }
}

fn is_internal(name: &str, registry: &MessageRegistry) -> bool {
    registry.get(name).is_some_and(|m| !m.is_emitted())
}

fn has_internal_ref(schema_type: &SchemaType, registry: &MessageRegistry) -> bool {
    schema_type
        .message_refs()
        .into_iter()
        .any(|name| is_internal(name, registry))
}

/// Swap references to internal messages for `Any`, keeping map shape
fn replace_internal(schema_type: SchemaType, registry: &MessageRegistry) -> SchemaType {
    match schema_type {
        SchemaType::Message(name) if is_internal(&name, registry) => SchemaType::any(),
        SchemaType::Map { key, value } => SchemaType::Map {
            key: Box::new(replace_internal(*key, registry)),
            value: Box::new(replace_internal(*value, registry)),
        },
        other => other,
    }
}
