//! # Invoker
//!
//! An [`Invoker`] is a ready-to-call handle for one remote operation: the resolved method plus
//! the proxy it was bound to. It is created per request and dropped by the caller.
//!
//! Positional arguments are mapped onto the fields of the method's input message in declaration
//! order, so `getWeather(city: string)` is called with `["Paris"]`. Replies are wrapped in an
//! [`InvocationResult`] so callers never depend on the generated output type.
use crate::{BoxError, proxy::Proxy, registry::MethodSignature};
use prost_reflect::{DynamicMessage, MethodDescriptor, ReflectMessage, SerializeOptions};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("Invalid arguments for '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },
    #[error("Remote call to '{method}' failed: '{cause}'")]
    Remote {
        method: String,
        #[source]
        cause: BoxError,
    },
}

/// A bound, single-method callable.
pub struct Invoker {
    method: MethodDescriptor,
    proxy: Box<dyn Proxy>,
}

impl Invoker {
    pub fn new(method: MethodDescriptor, proxy: Box<dyn Proxy>) -> Self {
        Self { method, proxy }
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn signature(&self) -> MethodSignature {
        MethodSignature::from(&self.method)
    }

    /// Calls the remote method with positional arguments.
    ///
    /// Missing trailing arguments take their default value; extra arguments are rejected.
    pub fn invoke(&mut self, args: Vec<Value>) -> Result<InvocationResult, InvocationError> {
        let input = self.method.input();

        if args.len() > input.fields().len() {
            return Err(InvocationError::InvalidArguments {
                method: self.method.full_name().to_string(),
                reason: format!(
                    "expected at most {} argument(s), got {}",
                    input.fields().len(),
                    args.len()
                ),
            });
        }

        let body: Map<String, Value> = input
            .fields()
            .zip(args)
            .map(|(field, arg)| (field.name().to_string(), arg))
            .collect();

        self.invoke_message(Value::Object(body))
    }

    /// Calls the remote method with the whole input message given as a JSON object.
    pub fn invoke_message(&mut self, body: Value) -> Result<InvocationResult, InvocationError> {
        let request = DynamicMessage::deserialize(self.method.input(), body).map_err(|e| {
            InvocationError::InvalidArguments {
                method: self.method.full_name().to_string(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(method = self.method.full_name(), "invoking remote method");

        let reply = self
            .proxy
            .call(&self.method, request)
            .map_err(|cause| InvocationError::Remote {
                method: self.method.full_name().to_string(),
                cause,
            })?;

        Ok(InvocationResult { message: reply })
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("method", &self.method.full_name())
            .finish_non_exhaustive()
    }
}

/// Uniform wrapper around the reply of a remote call.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    message: DynamicMessage,
}

impl InvocationResult {
    pub fn message(&self) -> &DynamicMessage {
        &self.message
    }

    pub fn into_message(self) -> DynamicMessage {
        self.message
    }

    /// The whole reply as JSON, keyed by field name, default values included.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let options = SerializeOptions::new()
            .skip_default_fields(false)
            .use_proto_field_name(true);
        self.message
            .serialize_with_options(serde_json::value::Serializer, &options)
    }

    /// The unwrapped return value when the reply has exactly one field.
    pub fn value(&self) -> Option<Value> {
        let descriptor = self.message.descriptor();
        let mut fields = descriptor.fields();

        match (fields.next(), fields.next()) {
            (Some(only), None) => self.to_json().ok()?.get_mut(only.name()).map(Value::take),
            _ => None,
        }
    }
}
