//! Named schema registry
//!
//! Holds compiled schemas by name. Defining a name that already exists
//! replaces the previous schema; instances created from the old schema keep
//! their own `Arc` and are unaffected.
//!
//! Declaration files hold either one declaration object or an array of
//! them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::compiled::CompiledSchema;
use super::compiler::compile;
use super::errors::{CompileError, CompileResult};
use super::types::SchemaDecl;
use crate::observability::Event;

#[derive(Deserialize)]
#[serde(untagged)]
enum DeclFile {
    Many(Vec<SchemaDecl>),
    One(SchemaDecl),
}

/// In-memory registry of compiled schemas keyed by name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<CompiledSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `decl` and registers it under its name.
    ///
    /// A failed compilation leaves any existing definition in place.
    pub fn define(&mut self, decl: &SchemaDecl) -> CompileResult<Arc<CompiledSchema>> {
        let schema = compile(decl)?;
        let event = match self.schemas.insert(decl.name.clone(), Arc::clone(&schema)) {
            Some(_) => Event::SchemaRedefined,
            None => Event::SchemaDefined,
        };
        tracing::debug!(event = %event, schema = %decl.name);
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CompiledSchema>> {
        self.schemas.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<CompiledSchema>> {
        let removed = self.schemas.remove(name);
        if removed.is_some() {
            tracing::debug!(event = %Event::SchemaRemoved, schema = name);
        }
        removed
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Loads and defines every declaration in a JSON file.
    ///
    /// All declarations are compiled before any is registered, so a file
    /// with one bad declaration changes nothing. Returns the defined names
    /// in file order.
    pub fn load_file(&mut self, path: &Path) -> CompileResult<Vec<String>> {
        let content = fs::read_to_string(path).map_err(|e| CompileError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let decls = match serde_json::from_str(&content) {
            Ok(DeclFile::Many(decls)) => decls,
            Ok(DeclFile::One(decl)) => vec![decl],
            Err(e) => {
                return Err(CompileError::Malformed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let compiled = decls
            .iter()
            .map(|decl| compile(decl).map(|schema| (decl.name.clone(), schema)))
            .collect::<CompileResult<Vec<_>>>()?;

        let names: Vec<String> = compiled.iter().map(|(name, _)| name.clone()).collect();
        self.schemas.extend(compiled);

        tracing::info!(
            event = %Event::SchemasLoaded,
            path = %path.display(),
            count = names.len()
        );
        Ok(names)
    }
}
