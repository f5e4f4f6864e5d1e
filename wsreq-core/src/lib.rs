//! # wsreq Core
//!
//! `wsreq-core` builds, at run time, a callable client for a remote service described by a
//! WSDL-style descriptor. Nothing has to be generated or compiled ahead of time: the whole
//! pipeline runs when the client is initialized.
//!
//! ## Pipeline
//!
//! 1. **[`workspace`]:** derives a content-addressed directory pair (`src/`, `bin/`) from the
//!    descriptor address.
//! 2. **[`descriptor`]:** retrieves the descriptor and drives the external generator, which
//!    writes `.proto` sources and reports the declared interfaces and services.
//! 3. **[`build`]:** compiles the generated sources into a binary descriptor set through a
//!    [`build::Toolchain`] (`protoc` by default).
//! 4. **[`registry`]:** loads that build's artifacts into an isolated `DescriptorPool` and indexes
//!    interfaces, services and their methods by declared name.
//! 5. **[`client`]:** resolves `(interface, service, method)` into an [`invoker::Invoker`] bound to
//!    a live proxy created by a [`proxy::ProxyFactory`].
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
//! let mut invoker = client.request_method("getWeather")?;
//! let result = invoker.invoke(vec![serde_json::json!("Paris")])?;
//! println!("{:?}", result.value());
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost-reflect` and `tonic` so that custom proxies and toolchains
//! use compatible versions of these dependencies.
pub mod build;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod invoker;
pub mod proxy;
pub mod registry;
pub mod workspace;

// Re-exports
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
