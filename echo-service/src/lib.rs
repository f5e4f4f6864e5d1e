//! # Echo Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-process gRPC server,
//! its `.proto` source and its descriptor set for integration testing `wsreq`.
//! It is not intended for production use.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/echo.rs"));
}

use pb::{EchoRequest, EchoResponse};
use tonic::{Request, Response, Status};

pub use pb::echo_port_server::{EchoPort, EchoPortServer};

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");

/// The `.proto` source the descriptor set above was compiled from.
pub const PROTO_SOURCE: &str = include_str!("../proto/echo.proto");

/// Reference implementation of `echo.EchoPort`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoPortImpl;

#[tonic::async_trait]
impl EchoPort for EchoPortImpl {
    async fn echo(&self, request: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        Ok(Response::new(EchoResponse {
            message: request.into_inner().message,
        }))
    }

    async fn shout(&self, request: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        Ok(Response::new(EchoResponse {
            message: request.into_inner().message.to_uppercase(),
        }))
    }

    async fn fail(&self, request: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        Err(Status::unavailable(format!(
            "echo refused '{}'",
            request.into_inner().message
        )))
    }
}
