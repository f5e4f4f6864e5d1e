//! # gRPC Proxies
//!
//! A [`ProxyFactory`] backed by `tonic`. Proxies perform unary calls with dynamic messages,
//! building the HTTP/2 path (`/package.Service/Method`) at run time.
//!
//! The factory owns a current-thread Tokio runtime shared by all of its proxies; every call
//! blocks the caller's thread on it. Do not call proxies from inside another Tokio runtime.
use super::{Proxy, ProxyError, ProxyFactory, codec::DynamicCodec};
use crate::BoxError;
use http_body::Body as HttpBody;
use prost_reflect::{DynamicMessage, MethodDescriptor, ServiceDescriptor};
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tonic::{
    client::GrpcService,
    transport::{Channel, Endpoint},
};

#[derive(thiserror::Error, Debug)]
pub enum GrpcRequestError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Streaming method '{0}' cannot be called through a proxy")]
    Streaming(String),
    #[error("Invalid gRPC path '{path}': '{source}'")]
    InvalidPath {
        path: String,
        #[source]
        source: http::uri::InvalidUri,
    },
    #[error("Remote call failed: '{0}'")]
    Status(#[from] tonic::Status),
}

type Connect<S> = Box<dyn Fn(&str) -> Result<S, ProxyError> + Send + Sync>;

pub struct GrpcProxyFactory<S = Channel> {
    runtime: Arc<Runtime>,
    connect: Connect<S>,
}

impl GrpcProxyFactory<Channel> {
    /// Creates a factory whose proxies open lazy channels to the requested address.
    ///
    /// No connection is attempted until the first call.
    pub fn new() -> io::Result<Self> {
        let runtime = Arc::new(Builder::new_current_thread().enable_all().build()?);
        let handle = runtime.handle().clone();

        let connect: Connect<Channel> = Box::new(move |address: &str| {
            let endpoint = Endpoint::from_shared(address.to_string()).map_err(|e| {
                ProxyError::InvalidAddress {
                    address: address.to_string(),
                    source: e.into(),
                }
            })?;

            // The channel spawns its worker on the ambient runtime.
            let _guard = handle.enter();
            Ok(endpoint.connect_lazy())
        });

        Ok(Self { runtime, connect })
    }
}

impl<S> GrpcProxyFactory<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Creates a factory handing out clones of an existing Tonic service, ignoring addresses.
    ///
    /// Mostly useful to serve an in-process implementation.
    pub fn from_service(service: S) -> io::Result<Self> {
        let runtime = Arc::new(Builder::new_current_thread().enable_all().build()?);
        let connect: Connect<S> = Box::new(move |_: &str| Ok(service.clone()));

        Ok(Self { runtime, connect })
    }
}

impl<S> ProxyFactory for GrpcProxyFactory<S>
where
    S: GrpcService<tonic::body::Body> + Send + 'static,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    fn create(
        &self,
        interface: &ServiceDescriptor,
        address: &str,
    ) -> Result<Box<dyn Proxy>, ProxyError> {
        tracing::debug!(interface = interface.full_name(), address, "creating gRPC proxy");

        let service = (self.connect)(address)?;

        Ok(Box::new(GrpcProxy {
            runtime: self.runtime.clone(),
            client: tonic::client::Grpc::new(service),
        }))
    }
}

/// A blocking, unary-only dynamic gRPC client.
pub struct GrpcProxy<S = Channel> {
    runtime: Arc<Runtime>,
    client: tonic::client::Grpc<S>,
}

impl<S> GrpcProxy<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Performs a Unary gRPC call (Single Request -> Single Response).
    pub fn unary(
        &mut self,
        method: &MethodDescriptor,
        payload: DynamicMessage,
    ) -> Result<DynamicMessage, GrpcRequestError> {
        if method.is_client_streaming() || method.is_server_streaming() {
            return Err(GrpcRequestError::Streaming(method.full_name().to_string()));
        }

        let path = http_path(method)?;
        let codec = DynamicCodec::new(method.output());
        let Self { runtime, client } = self;

        runtime.block_on(async move {
            client
                .ready()
                .await
                .map_err(|e| GrpcRequestError::ClientNotReady(e.into()))?;

            let response = client
                .unary(tonic::Request::new(payload), path, codec)
                .await?;

            Ok::<_, GrpcRequestError>(response.into_inner())
        })
    }
}

impl<S> Proxy for GrpcProxy<S>
where
    S: GrpcService<tonic::body::Body> + Send,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    fn call(
        &mut self,
        method: &MethodDescriptor,
        request: DynamicMessage,
    ) -> Result<DynamicMessage, BoxError> {
        Ok(self.unary(method, request)?)
    }
}

fn http_path(method: &MethodDescriptor) -> Result<http::uri::PathAndQuery, GrpcRequestError> {
    let path = format!("/{}/{}", method.parent_service().full_name(), method.name());
    http::uri::PathAndQuery::from_str(&path)
        .map_err(|source| GrpcRequestError::InvalidPath { path, source })
}
