//! # Type Registry
//!
//! Loads the artifacts of one build run into a `DescriptorPool` owned by this registry and
//! indexes what the generator declared.
//!
//! The pool starts as a copy of a *host* pool (the process-wide `prost-reflect` pool by
//! default), so generated definitions may reference anything the host already knows about.
//! Artifacts are decoded into the copy only: registries of different endpoints never see each
//! other's definitions.
//!
//! Each interface gets a [`MethodTable`] built once at load time. Methods keep the order in which
//! they are declared in the compiled descriptor, and a name lookup returns the first declared
//! method with that name.
mod types;

pub use types::*;

use crate::{build::BuildOutput, descriptor::GeneratedModel};
use prost_reflect::{DescriptorError, DescriptorPool, MethodDescriptor, ServiceDescriptor};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read artifact '{}': '{source}'", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to decode artifact '{}': '{source}'", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },
    #[error("Type '{full_name}' declared as '{name}' is missing from the compiled output")]
    Missing { name: String, full_name: String },
    #[error("Type '{full_name}' declared as interface '{name}' is not a service definition")]
    NotAnInterface { name: String, full_name: String },
}

/// The methods of one interface, in declaration order, with a by-name index.
#[derive(Debug, Clone)]
pub struct MethodTable {
    methods: Vec<MethodDescriptor>,
    by_name: HashMap<String, usize>,
}

impl MethodTable {
    pub fn new(service: &ServiceDescriptor) -> Self {
        let methods: Vec<_> = service.methods().collect();
        let mut by_name = HashMap::with_capacity(methods.len());

        for (index, method) in methods.iter().enumerate() {
            by_name.entry(method.name().to_string()).or_insert(index);
        }

        Self { methods, by_name }
    }

    /// First declared method with the given name.
    pub fn find(&self, name: &str) -> Option<&MethodDescriptor> {
        self.by_name.get(name).map(|&index| &self.methods[index])
    }

    /// The method bound when the caller does not name one.
    pub fn default_method(&self) -> Option<&MethodDescriptor> {
        self.methods.first()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// An interface declared by the generator, resolved against the compiled output.
#[derive(Debug, Clone)]
pub struct LoadedInterface {
    name: String,
    descriptor: ServiceDescriptor,
    methods: MethodTable,
}

impl LoadedInterface {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    pub fn signatures(&self) -> Vec<MethodSignature> {
        self.methods.iter().map(MethodSignature::from).collect()
    }
}

/// A service binding declared by the generator, resolved against the compiled output.
#[derive(Debug, Clone)]
pub struct LoadedService {
    name: String,
    symbol: Symbol,
}

impl LoadedService {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

/// Insertion-ordered map where a repeated key replaces the earlier value in place.
#[derive(Debug, Clone)]
struct Index<T> {
    entries: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> Index<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn insert(&mut self, key: &str, value: T) {
        match self.positions.get(key) {
            Some(&position) => self.entries[position] = value,
            None => {
                self.positions.insert(key.to_string(), self.entries.len());
                self.entries.push(value);
            }
        }
    }

    fn get(&self, key: &str) -> Option<&T> {
        self.positions.get(key).map(|&position| &self.entries[position])
    }
}

/// Read-only index from declared names to loaded definitions.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    pool: DescriptorPool,
    interfaces: Index<LoadedInterface>,
    services: Index<LoadedService>,
}

impl TypeRegistry {
    /// Loads `build`'s artifacts on top of the process-wide pool and resolves `model`.
    pub fn load(build: &BuildOutput, model: &GeneratedModel) -> Result<Self, LoadError> {
        Self::load_with_host(build, model, DescriptorPool::global())
    }

    /// Loads `build`'s artifacts on top of a copy of `host` and resolves `model`.
    pub fn load_with_host(
        build: &BuildOutput,
        model: &GeneratedModel,
        host: DescriptorPool,
    ) -> Result<Self, LoadError> {
        let mut pool = host;

        for path in &build.artifacts {
            tracing::debug!(artifact = %path.display(), "loading compiled artifact");

            let bytes = fs::read(path).map_err(|source| LoadError::Artifact {
                path: path.clone(),
                source,
            })?;
            pool.decode_file_descriptor_set(bytes.as_slice())
                .map_err(|source| LoadError::Decode {
                    path: path.clone(),
                    source,
                })?;
        }

        let mut interfaces = Index::new();
        for declared in &model.interfaces {
            let descriptor = match lookup(&pool, &declared.full_name) {
                Some(Symbol::Service(descriptor)) => descriptor,
                Some(_) => {
                    return Err(LoadError::NotAnInterface {
                        name: declared.name.clone(),
                        full_name: declared.full_name.clone(),
                    });
                }
                None => {
                    return Err(LoadError::Missing {
                        name: declared.name.clone(),
                        full_name: declared.full_name.clone(),
                    });
                }
            };

            let methods = MethodTable::new(&descriptor);
            interfaces.insert(
                &declared.name,
                LoadedInterface {
                    name: declared.name.clone(),
                    descriptor,
                    methods,
                },
            );
        }

        let mut services = Index::new();
        for declared in &model.services {
            let symbol =
                lookup(&pool, &declared.full_name).ok_or_else(|| LoadError::Missing {
                    name: declared.name.clone(),
                    full_name: declared.full_name.clone(),
                })?;

            services.insert(
                &declared.name,
                LoadedService {
                    name: declared.name.clone(),
                    symbol,
                },
            );
        }

        Ok(Self {
            pool,
            interfaces,
            services,
        })
    }

    /// Names of the declared interfaces, in the order the generator reported them.
    pub fn interfaces(&self) -> Vec<&str> {
        self.interfaces.entries.iter().map(|i| i.name()).collect()
    }

    /// Names of the declared services, in the order the generator reported them.
    pub fn services(&self) -> Vec<&str> {
        self.services.entries.iter().map(|s| s.name()).collect()
    }

    pub fn interface(&self, name: &str) -> Option<&LoadedInterface> {
        self.interfaces.get(name)
    }

    pub fn service(&self, name: &str) -> Option<&LoadedService> {
        self.services.get(name)
    }

    /// The pool owned by this registry.
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

fn lookup(pool: &DescriptorPool, full_name: &str) -> Option<Symbol> {
    if let Some(descriptor) = pool.get_service_by_name(full_name) {
        return Some(Symbol::Service(descriptor));
    }
    if let Some(descriptor) = pool.get_message_by_name(full_name) {
        return Some(Symbol::Message(descriptor));
    }
    if let Some(descriptor) = pool.get_enum_by_name(full_name) {
        return Some(Symbol::Enum(descriptor));
    }
    None
}
