//! Declaration and resolution caches behind the type resolver.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{ImportRecord, ResolvedType, TypeDeclaration, TypeDefinitions};

/// A declaration together with the file it was extracted from.
#[derive(Debug, Clone)]
pub(crate) struct CachedDeclaration {
    pub declaration: TypeDeclaration,
    pub file: String,
}

/// Shared caches owned by one [`TypeResolver`](super::TypeResolver).
///
/// Locks are only taken inside these synchronous accessors, never across an
/// await point.
#[derive(Debug, Default)]
pub(crate) struct TypeCache {
    /// Keyed by `"{file}:{name}"` and by bare `"{name}"`.
    declarations: RwLock<FxHashMap<String, CachedDeclaration>>,
    /// Keyed by `(importing file, referenced name)`.
    resolved: RwLock<FxHashMap<(String, String), Arc<ResolvedType>>>,
    /// Import inventories of extracted files.
    imports: RwLock<FxHashMap<String, Vec<ImportRecord>>>,
    /// Files whose definitions have been extracted, successfully or not.
    files: RwLock<FxHashSet<String>>,
}

impl TypeCache {
    pub fn record_file(&self, file: &str, definitions: &TypeDefinitions) {
        {
            let mut declarations = self.declarations.write();
            for declaration in definitions.declarations() {
                let entry = CachedDeclaration {
                    declaration: declaration.clone(),
                    file: file.to_string(),
                };
                declarations.insert(format!("{file}:{}", declaration.name), entry.clone());
                declarations.insert(declaration.name.clone(), entry);
            }
        }
        self.imports
            .write()
            .insert(file.to_string(), definitions.imports.clone());
        self.files.write().insert(file.to_string());
    }

    pub fn is_extracted(&self, file: &str) -> bool {
        self.files.read().contains(file)
    }

    /// Marks a file as visited without definitions, so it is not read again.
    pub fn mark_extracted(&self, file: &str) {
        self.files.write().insert(file.to_string());
    }

    pub fn declaration(&self, key: &str) -> Option<CachedDeclaration> {
        self.declarations.read().get(key).cloned()
    }

    pub fn file_declaration(&self, file: &str, name: &str) -> Option<CachedDeclaration> {
        self.declaration(&format!("{file}:{name}"))
    }

    pub fn imports_of(&self, file: &str) -> Vec<ImportRecord> {
        self.imports.read().get(file).cloned().unwrap_or_default()
    }

    pub fn resolved(&self, file: &str, name: &str) -> Option<Arc<ResolvedType>> {
        self.resolved
            .read()
            .get(&(file.to_string(), name.to_string()))
            .cloned()
    }

    /// Stores a resolution unless one already exists, returning the stored value.
    pub fn store(&self, file: &str, name: &str, resolved: ResolvedType) -> Arc<ResolvedType> {
        self.resolved
            .write()
            .entry((file.to_string(), name.to_string()))
            .or_insert_with(|| Arc::new(resolved))
            .clone()
    }

    pub fn clear(&self) {
        self.declarations.write().clear();
        self.resolved.write().clear();
        self.imports.write().clear();
        self.files.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            declarations: self.declarations.read().len(),
            resolved: self.resolved.read().len(),
            files: self.files.read().len(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Declaration entries, counting both key forms.
    pub declarations: usize,

    /// Resolved `(file, name)` entries.
    pub resolved: usize,

    /// Files whose definitions have been extracted.
    pub files: usize,
}
