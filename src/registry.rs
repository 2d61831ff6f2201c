//! Message Registry
//!
//! Single store of every message discovered during collection. Messages are
//! registered as empty skeletons and filled exactly once on first `resolve`;
//! after that they are read-only. Resolution of an embedded message is
//! triggered on demand, so callers may resolve in any order.
//!
//! Internal messages (unexported structs) live here too so they can be
//! embedded, but they are never emitted.

use std::collections::HashMap;

use tracing::debug;

use crate::codegen::fields::FieldExtractor;
use crate::codegen::types::{Cardinality, SchemaType};
use crate::error::{ProtoGenError, Result};
use crate::schema::Member;

/// A single field of a generated message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtoField {
    /// Declared member name
    pub name: String,
    /// Resolved schema type
    pub schema_type: SchemaType,
    pub cardinality: Cardinality,
    /// Name on the wire (tag value or snake_case of `name`)
    pub wire_name: String,
}

/// A message and the declaration it came from
#[derive(Debug, Clone)]
pub struct ProtoMessage {
    pub name: String,
    /// Host file the struct was declared in
    pub origin_file: String,
    fields: Vec<ProtoField>,
    members: Vec<Member>,
    resolved: bool,
    emit: bool,
}

impl ProtoMessage {
    /// Create an unresolved skeleton
    pub fn new(name: impl Into<String>, origin_file: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            origin_file: origin_file.into(),
            fields: Vec::new(),
            members,
            resolved: false,
            emit: true,
        }
    }

    /// Create a skeleton that can be embedded but is never emitted
    pub fn internal(name: impl Into<String>, origin_file: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            emit: false,
            ..Self::new(name, origin_file, members)
        }
    }

    /// Extracted fields; empty until resolved
    pub fn fields(&self) -> &[ProtoField] {
        &self.fields
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Whether the message is rendered into a schema file
    pub fn is_emitted(&self) -> bool {
        self.emit
    }
}

/// Memoizing store of messages keyed by name
#[derive(Debug, Default)]
pub struct MessageRegistry {
    messages: HashMap<String, ProtoMessage>,
    /// Registration order, for deterministic output
    order: Vec<String>,
    /// Messages currently being resolved (embedding stack)
    resolving: Vec<String>,
}

impl MessageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message skeleton. Names are unique across all input files.
    pub fn register(&mut self, message: ProtoMessage) -> Result<()> {
        if let Some(existing) = self.messages.get(&message.name) {
            return Err(ProtoGenError::NameCollision {
                name: message.name.clone(),
                first: existing.origin_file.clone(),
                second: message.origin_file,
            });
        }
        self.order.push(message.name.clone());
        self.messages.insert(message.name.clone(), message);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ProtoMessage> {
        self.messages.get(name)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages in registration order
    pub fn all(&self) -> impl Iterator<Item = &ProtoMessage> {
        self.order.iter().filter_map(|name| self.messages.get(name))
    }

    /// Messages rendered into schema files, in registration order
    pub fn emitted(&self) -> impl Iterator<Item = &ProtoMessage> {
        self.all().filter(|m| m.emit)
    }

    /// Resolve a message's fields, resolving embedded messages first.
    ///
    /// Idempotent: an already resolved message is returned as-is.
    pub fn resolve(&mut self, name: &str, extractor: &FieldExtractor<'_>) -> Result<&ProtoMessage> {
        let members = match self.messages.get(name) {
            None => {
                return Err(ProtoGenError::UnknownMessage {
                    name: name.to_string(),
                    referenced_by: self.resolving.last().cloned().unwrap_or_else(|| "<root>".to_string()),
                })
            }
            Some(message) if message.resolved => None,
            Some(message) => Some(message.members.clone()),
        };

        if let Some(members) = members {
            if let Some(start) = self.resolving.iter().position(|n| n == name) {
                let mut chain = self.resolving[start..].to_vec();
                chain.push(name.to_string());
                return Err(ProtoGenError::EmbeddingCycle { chain });
            }

            self.resolving.push(name.to_string());
            let extracted = extractor.extract(name, &members, self);
            self.resolving.pop();
            let fields = extracted?;

            debug!(name, fields = fields.len(), "resolved message");
            if let Some(message) = self.messages.get_mut(name) {
                message.fields = fields;
                message.resolved = true;
            }
        }

        self.messages.get(name).ok_or_else(|| ProtoGenError::UnknownMessage {
            name: name.to_string(),
            referenced_by: "<root>".to_string(),
        })
    }

    /// Resolve every emitted message.
    ///
    /// Internal messages are resolved only when something embeds them.
    pub fn resolve_all(&mut self, extractor: &FieldExtractor<'_>) -> Result<()> {
        let names: Vec<String> = self.emitted().map(|m| m.name.clone()).collect();
        for name in &names {
            self.resolve(name, extractor)?;
        }
        Ok(())
    }

    /// Emitted message names declared in a host file, in registration order
    pub fn messages_in(&self, file: &str) -> Vec<&str> {
        self.emitted()
            .filter(|m| m.origin_file == file)
            .map(|m| m.name.as_str())
            .collect()
    }
}
