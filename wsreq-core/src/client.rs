//! # Web Service Client
//!
//! The [`WebServiceClient`] ties the pipeline together. It uses a **Typestate Pattern** with
//! two states:
//!
//! 1. **[`Pending`]**: constructed from a descriptor address and a [`ClientConfig`]. External
//!    collaborators (generator, toolchain, proxy factory) can be swapped in this state.
//! 2. **[`Ready`]**: produced by [`WebServiceClient::init`]. The type registry is built and
//!    read-only; the client hands out [`Invoker`]s for any declared operation.
//!
//! `init` consumes the pending client, so a failed initialization leaves nothing behind that
//! could be reused by mistake. Request failures, on the other hand, never affect the registry:
//! a caller may retry with different names.
//!
//! Concurrent `init` calls for the same address race on the same workspace directories.
//! Callers constructing clients from several threads must serialize them per address.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsreq_core::client::WebServiceClient;
//! use wsreq_core::config::ClientConfig;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WebServiceClient::new("http://example.org/svc?wsdl", ClientConfig::default())
//!     .init()?;
//!
//! for interface in client.interfaces() {
//!     for signature in client.methods(interface)? {
//!         println!("{interface}: {signature}");
//!     }
//! }
//!
//! let mut invoker = client.request_with("WeatherPort", "WeatherService", Some("getWeather"))?;
//! let result = invoker.invoke(vec![serde_json::json!("Paris")])?;
//! # Ok(())
//! # }
//! ```
use crate::{
    build::{BuildStage, CompileError, Protoc, Toolchain},
    config::ClientConfig,
    descriptor::{CommandGenerator, DescriptorCompiler, DescriptorError, Generator},
    invoker::Invoker,
    proxy::{ProxyError, ProxyFactory, grpc::GrpcProxyFactory},
    registry::{LoadError, MethodSignature, TypeRegistry},
    workspace::Workspace,
};
use prost_reflect::DescriptorPool;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that abort client initialization.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to prepare workspace under '{}': '{source}'", .root.display())]
    Workspace {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("Failed to load compiled types: '{0}'")]
    Load(#[from] LoadError),
    #[error("Failed to start the transport runtime: '{0}'")]
    Transport(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Interface,
    Service,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Interface => f.write_str("interface"),
            SymbolKind::Service => f.write_str("service"),
        }
    }
}

/// Errors returned when resolving an operation.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Unknown {kind} '{name}'")]
    NotFound { kind: SymbolKind, name: String },
    #[error("The descriptor does not declare any {kind}")]
    Empty { kind: SymbolKind },
    #[error("No method {} in interface '{interface}'", describe_method(.method))]
    NoSuchMethod {
        interface: String,
        method: Option<String>,
    },
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

fn describe_method(method: &Option<String>) -> String {
    match method {
        Some(name) => format!("'{name}'"),
        None => "to bind by default".to_string(),
    }
}

/// A client for the service described at one descriptor address.
///
/// The generic parameter `T` represents the current state of the client.
pub struct WebServiceClient<T> {
    address: String,
    state: T,
}

/// State: not initialized yet, collaborators can still be replaced.
pub struct Pending {
    config: ClientConfig,
    generator: Option<Box<dyn Generator>>,
    toolchain: Option<Box<dyn Toolchain>>,
    proxy_factory: Option<Box<dyn ProxyFactory>>,
    host_pool: Option<DescriptorPool>,
}

/// State: initialized, registry built.
pub struct Ready {
    workspace: Workspace,
    registry: TypeRegistry,
    proxy_factory: Box<dyn ProxyFactory>,
    service_address: String,
}

impl<T> WebServiceClient<T> {
    /// The descriptor address this client was built for.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl WebServiceClient<Pending> {
    pub fn new(address: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            address: address.into(),
            state: Pending {
                config,
                generator: None,
                toolchain: None,
                proxy_factory: None,
                host_pool: None,
            },
        }
    }

    /// Replaces the [`CommandGenerator`] configured in [`ClientConfig::generator`].
    pub fn with_generator(mut self, generator: impl Generator + 'static) -> Self {
        self.state.generator = Some(Box::new(generator));
        self
    }

    /// Replaces the [`Protoc`] toolchain configured in [`ClientConfig::protoc`].
    pub fn with_toolchain(mut self, toolchain: impl Toolchain + 'static) -> Self {
        self.state.toolchain = Some(Box::new(toolchain));
        self
    }

    /// Replaces the default [`GrpcProxyFactory`].
    pub fn with_proxy_factory(mut self, factory: impl ProxyFactory + 'static) -> Self {
        self.state.proxy_factory = Some(Box::new(factory));
        self
    }

    /// Replaces the process-wide pool generated types are loaded on top of.
    pub fn with_host_pool(mut self, pool: DescriptorPool) -> Self {
        self.state.host_pool = Some(pool);
        self
    }

    /// Runs the whole pipeline: workspace, generation, compilation and loading.
    ///
    /// Every stage blocks the calling thread. The first failing stage aborts initialization.
    pub fn init(self) -> Result<WebServiceClient<Ready>, InitError> {
        let Pending {
            config,
            generator,
            toolchain,
            proxy_factory,
            host_pool,
        } = self.state;
        let address = self.address;

        let workspace = Workspace::prepare(&config.workspace_root, &address).map_err(|source| {
            InitError::Workspace {
                root: config.workspace_root.clone(),
                source,
            }
        })?;

        let generator: Box<dyn Generator> = match generator {
            Some(generator) => generator,
            None => Box::new(
                CommandGenerator::new(config.generator.program.clone())
                    .with_args(config.generator.args.iter().cloned()),
            ),
        };
        let model = DescriptorCompiler::new(generator).generate(&address, &workspace)?;

        let toolchain: Box<dyn Toolchain> = match toolchain {
            Some(toolchain) => toolchain,
            None => Box::new(Protoc::new(config.protoc.clone())),
        };
        let build = BuildStage::new(toolchain, config.include_paths.clone())
            .compile(workspace.source_dir(), workspace.binary_dir())?;

        let registry = TypeRegistry::load_with_host(
            &build,
            &model,
            host_pool.unwrap_or_else(DescriptorPool::global),
        )?;

        let proxy_factory: Box<dyn ProxyFactory> = match proxy_factory {
            Some(factory) => factory,
            None => Box::new(GrpcProxyFactory::new().map_err(InitError::Transport)?),
        };

        tracing::info!(
            address = %address,
            interfaces = ?registry.interfaces(),
            services = ?registry.services(),
            "web service client ready"
        );

        let service_address = config.service_address.unwrap_or_else(|| address.clone());

        Ok(WebServiceClient {
            address,
            state: Ready {
                workspace,
                registry,
                proxy_factory,
                service_address,
            },
        })
    }
}

impl WebServiceClient<Ready> {
    /// Names of the declared interfaces.
    pub fn interfaces(&self) -> Vec<&str> {
        self.state.registry.interfaces()
    }

    /// Names of the declared services.
    pub fn services(&self) -> Vec<&str> {
        self.state.registry.services()
    }

    /// Signatures of the methods of `interface`, in declaration order.
    pub fn methods(&self, interface: &str) -> Result<Vec<MethodSignature>, RequestError> {
        self.state
            .registry
            .interface(interface)
            .map(|i| i.signatures())
            .ok_or_else(|| RequestError::NotFound {
                kind: SymbolKind::Interface,
                name: interface.to_string(),
            })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.state.registry
    }

    pub fn workspace(&self) -> &Workspace {
        &self.state.workspace
    }

    /// Address the proxies are bound to.
    pub fn service_address(&self) -> &str {
        &self.state.service_address
    }

    /// Binds the default method of the first interface, through the first service.
    ///
    /// Only meaningful for descriptors declaring a single interface and service.
    pub fn request(&self) -> Result<Invoker, RequestError> {
        let (interface, service) = self.first_pair()?;
        self.request_with(interface, service, None)
    }

    /// Binds `method` of the first interface, through the first service.
    pub fn request_method(&self, method: &str) -> Result<Invoker, RequestError> {
        let (interface, service) = self.first_pair()?;
        self.request_with(interface, service, Some(method))
    }

    /// Binds `method` of `interface` through `service`.
    ///
    /// Without a method name the first declared method is bound. An unknown method name always
    /// fails with [`RequestError::NoSuchMethod`]: the method is resolved before any proxy is
    /// created.
    pub fn request_with(
        &self,
        interface: &str,
        service: &str,
        method: Option<&str>,
    ) -> Result<Invoker, RequestError> {
        let registry = &self.state.registry;

        registry
            .service(service)
            .ok_or_else(|| RequestError::NotFound {
                kind: SymbolKind::Service,
                name: service.to_string(),
            })?;

        let loaded = registry
            .interface(interface)
            .ok_or_else(|| RequestError::NotFound {
                kind: SymbolKind::Interface,
                name: interface.to_string(),
            })?;

        let table = loaded.methods();
        let resolved = match method {
            Some(name) => table.find(name),
            None => {
                if table.len() > 1 {
                    tracing::warn!(
                        interface,
                        candidates = table.len(),
                        "no method named, binding the first declared one"
                    );
                }
                table.default_method()
            }
        }
        .cloned()
        .ok_or_else(|| RequestError::NoSuchMethod {
            interface: interface.to_string(),
            method: method.map(str::to_string),
        })?;

        tracing::debug!(
            interface,
            service,
            method = resolved.name(),
            address = %self.state.service_address,
            "binding invoker"
        );

        let proxy = self
            .state
            .proxy_factory
            .create(loaded.descriptor(), &self.state.service_address)?;

        Ok(Invoker::new(resolved, proxy))
    }

    fn first_pair(&self) -> Result<(&str, &str), RequestError> {
        let registry = &self.state.registry;

        let interface = registry
            .interfaces()
            .first()
            .copied()
            .ok_or(RequestError::Empty {
                kind: SymbolKind::Interface,
            })?;
        let service = registry
            .services()
            .first()
            .copied()
            .ok_or(RequestError::Empty {
                kind: SymbolKind::Service,
            })?;

        Ok((interface, service))
    }
}
