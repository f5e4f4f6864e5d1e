//! # Remote Proxies
//!
//! The transport seam of the client. A [`ProxyFactory`] turns an interface definition and an
//! address into a [`Proxy`], the object that actually performs remote calls with dynamic
//! messages.
//!
//! Creating a proxy must not block on network I/O; only calls do. A proxy is not assumed to be
//! safe for concurrent calls, hence `call` takes `&mut self`.
//!
//! [`grpc::GrpcProxyFactory`] is the transport shipped with this crate.
pub mod codec;
pub mod grpc;

use crate::BoxError;
use prost_reflect::{DynamicMessage, MethodDescriptor, ServiceDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid address '{address}': '{source}'")]
    InvalidAddress {
        address: String,
        #[source]
        source: BoxError,
    },
    #[error("Failed to create proxy for '{interface}': '{source}'")]
    Create {
        interface: String,
        #[source]
        source: BoxError,
    },
}

/// A live handle able to call the methods of one interface.
pub trait Proxy: Send {
    /// Performs one remote call of `method` with `request`.
    ///
    /// Any failure (transport error, remote fault) is returned as-is; proxies do not retry.
    fn call(
        &mut self,
        method: &MethodDescriptor,
        request: DynamicMessage,
    ) -> Result<DynamicMessage, BoxError>;
}

/// Creates proxies bound to an interface and an address.
pub trait ProxyFactory: Send + Sync {
    fn create(
        &self,
        interface: &ServiceDescriptor,
        address: &str,
    ) -> Result<Box<dyn Proxy>, ProxyError>;
}
