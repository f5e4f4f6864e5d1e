#![allow(dead_code)]

use prost::Message;
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
    field_descriptor_proto::{Label, Type},
};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wsreq_core::{
    BoxError,
    build::{CompileOutcome, CompileRequest, Diagnostic, Severity, Toolchain},
    descriptor::{
        DeclaredInterface, DeclaredService, GenerateError, GenerateRequest, GeneratedModel,
        Generator,
    },
    prost_reflect::{DynamicMessage, MethodDescriptor, ServiceDescriptor, Value},
    proxy::{Proxy, ProxyError, ProxyFactory},
};

pub const WEATHER_PROTO: &str = r#"syntax = "proto3";

package weather;

service WeatherPort {
  rpc getWeather(GetWeatherRequest) returns (GetWeatherResponse);
}

service EmptyPort {}

message WeatherService {
  string address = 1;
}

message GetWeatherRequest {
  string city = 1;
}

message GetWeatherResponse {
  string forecast = 1;
}
"#;

/// Writes a stub descriptor document and returns its path as the descriptor address.
pub fn descriptor_address(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, "<definitions/>").unwrap();
    path.to_str().unwrap().to_string()
}

pub fn interface(name: &str, full_name: &str) -> DeclaredInterface {
    DeclaredInterface {
        name: name.to_string(),
        full_name: full_name.to_string(),
    }
}

pub fn service(name: &str, full_name: &str) -> DeclaredService {
    DeclaredService {
        name: name.to_string(),
        full_name: full_name.to_string(),
    }
}

pub fn weather_model() -> GeneratedModel {
    GeneratedModel {
        interfaces: vec![interface("WeatherPort", "weather.WeatherPort")],
        services: vec![service("WeatherService", "weather.WeatherService")],
    }
}

pub fn echo_model() -> GeneratedModel {
    GeneratedModel {
        interfaces: vec![interface("EchoPort", "echo.EchoPort")],
        services: vec![service("EchoService", "echo.EchoService")],
    }
}

fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

/// The descriptor set `protoc` produces for [`WEATHER_PROTO`].
pub fn weather_descriptor_set() -> Vec<u8> {
    let file = FileDescriptorProto {
        name: Some("weather.proto".to_string()),
        package: Some("weather".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            message("WeatherService", vec![string_field("address", 1)]),
            message("GetWeatherRequest", vec![string_field("city", 1)]),
            message("GetWeatherResponse", vec![string_field("forecast", 1)]),
        ],
        service: vec![
            ServiceDescriptorProto {
                name: Some("WeatherPort".to_string()),
                method: vec![MethodDescriptorProto {
                    name: Some("getWeather".to_string()),
                    input_type: Some(".weather.GetWeatherRequest".to_string()),
                    output_type: Some(".weather.GetWeatherResponse".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ServiceDescriptorProto {
                name: Some("EmptyPort".to_string()),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    FileDescriptorSet { file: vec![file] }.encode_to_vec()
}

/// Writes fixed sources and reports a fixed model.
pub struct SourceGenerator {
    files: Vec<(&'static str, &'static str)>,
    model: GeneratedModel,
}

impl SourceGenerator {
    pub fn new(files: Vec<(&'static str, &'static str)>, model: GeneratedModel) -> Self {
        Self { files, model }
    }

    pub fn weather() -> Self {
        Self::new(vec![("weather/weather.proto", WEATHER_PROTO)], weather_model())
    }
}

impl Generator for SourceGenerator {
    fn generate(&self, request: GenerateRequest<'_>) -> Result<GeneratedModel, GenerateError> {
        for (name, content) in &self.files {
            let path = request.output_dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| GenerateError::Other(e.into()))?;
            }
            fs::write(&path, content).map_err(|e| GenerateError::Other(e.into()))?;
        }
        Ok(self.model.clone())
    }
}

/// "Compiles" by writing a prebuilt descriptor set, or fails on the first source.
pub struct PrebuiltToolchain {
    descriptor_set: Vec<u8>,
    error: Option<&'static str>,
}

impl PrebuiltToolchain {
    pub fn new(descriptor_set: Vec<u8>) -> Self {
        Self {
            descriptor_set,
            error: None,
        }
    }

    pub fn failing(error: &'static str) -> Self {
        Self {
            descriptor_set: Vec::new(),
            error: Some(error),
        }
    }
}

impl Toolchain for PrebuiltToolchain {
    fn source_extension(&self) -> &str {
        "proto"
    }

    fn compile(&self, request: CompileRequest<'_>) -> io::Result<CompileOutcome> {
        if let Some(error) = self.error {
            let file = request.sources[0].clone();
            return Ok(CompileOutcome {
                success: false,
                artifacts: vec![],
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    text: format!("{}:1:1: {error}", file.display()),
                    file: Some(file),
                }],
            });
        }

        let artifact = request.output_dir.join("descriptors.bin");
        fs::write(&artifact, &self.descriptor_set)?;
        Ok(CompileOutcome {
            success: true,
            artifacts: vec![artifact],
            diagnostics: vec![],
        })
    }
}

/// Answers every call with a forecast for the first argument.
#[derive(Clone, Default)]
pub struct ForecastFactory {
    pub created: Arc<AtomicUsize>,
}

impl ProxyFactory for ForecastFactory {
    fn create(
        &self,
        _interface: &ServiceDescriptor,
        _address: &str,
    ) -> Result<Box<dyn Proxy>, ProxyError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ForecastProxy))
    }
}

struct ForecastProxy;

impl Proxy for ForecastProxy {
    fn call(
        &mut self,
        method: &MethodDescriptor,
        request: DynamicMessage,
    ) -> Result<DynamicMessage, BoxError> {
        let city = request
            .get_field_by_name("city")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or("missing city")?;

        if city.is_empty() {
            return Err("remote fault: city is required".into());
        }

        let mut reply = DynamicMessage::new(method.output());
        reply.set_field_by_name("forecast", Value::String(format!("Sunny in {city}")));
        Ok(reply)
    }
}

/// Refuses to create any proxy.
pub struct RefusingFactory;

impl ProxyFactory for RefusingFactory {
    fn create(
        &self,
        interface: &ServiceDescriptor,
        _address: &str,
    ) -> Result<Box<dyn Proxy>, ProxyError> {
        Err(ProxyError::Create {
            interface: interface.full_name().to_string(),
            source: "transport disabled".into(),
        })
    }
}
