use common::{
    ForecastFactory, PrebuiltToolchain, RefusingFactory, SourceGenerator, descriptor_address,
    echo_model, interface, service, weather_descriptor_set, weather_model,
};
use std::sync::atomic::Ordering;
use wsreq_core::{
    build::CompileError,
    client::{InitError, Ready, RequestError, SymbolKind, WebServiceClient},
    config::ClientConfig,
    descriptor::{DescriptorError, GeneratedModel},
    invoker::InvocationError,
    registry::LoadError,
};

mod common;

fn config(root: &std::path::Path) -> ClientConfig {
    ClientConfig {
        workspace_root: root.join("ws"),
        ..ClientConfig::default()
    }
}

fn weather_client(root: &std::path::Path) -> WebServiceClient<Ready> {
    let address = descriptor_address(root, "weather.wsdl");
    WebServiceClient::new(address, config(root))
        .with_generator(SourceGenerator::weather())
        .with_toolchain(PrebuiltToolchain::new(weather_descriptor_set()))
        .with_proxy_factory(ForecastFactory::default())
        .init()
        .unwrap()
}

#[test]
fn test_weather_example() {
    let tmp = tempfile::tempdir().unwrap();
    let client = weather_client(tmp.path());

    assert_eq!(client.interfaces(), vec!["WeatherPort"]);
    assert_eq!(client.services(), vec!["WeatherService"]);

    let mut invoker = client.request_method("getWeather").unwrap();
    let result = invoker.invoke(vec![serde_json::json!("Paris")]).unwrap();

    assert_eq!(result.value(), Some(serde_json::json!("Sunny in Paris")));
}

#[test]
fn test_methods_lists_signatures() {
    let tmp = tempfile::tempdir().unwrap();
    let client = weather_client(tmp.path());

    let methods = client.methods("WeatherPort").unwrap();

    assert_eq!(methods.len(), 1);
    assert_eq!(
        methods[0].to_string(),
        "getWeather(city: string) -> string"
    );
    assert!(matches!(
        client.methods("Nope"),
        Err(RequestError::NotFound {
            kind: SymbolKind::Interface,
            ..
        })
    ));
}

#[test]
fn test_default_request_binds_the_only_method() {
    let tmp = tempfile::tempdir().unwrap();
    let client = weather_client(tmp.path());

    let invoker = client.request().unwrap();

    assert_eq!(invoker.method().name(), "getWeather");
}

#[test]
fn test_unknown_method_is_no_such_method() {
    let tmp = tempfile::tempdir().unwrap();
    let client = weather_client(tmp.path());

    let err = client.request_method("doesNotExist").unwrap_err();

    assert!(matches!(
        err,
        RequestError::NoSuchMethod { ref method, .. } if method.as_deref() == Some("doesNotExist")
    ));

    // The registry survives a failed request.
    assert!(client.request_method("getWeather").is_ok());
}

#[test]
fn test_unknown_method_wins_over_proxy_failures() {
    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "weather.wsdl");
    let client = WebServiceClient::new(address, config(tmp.path()))
        .with_generator(SourceGenerator::weather())
        .with_toolchain(PrebuiltToolchain::new(weather_descriptor_set()))
        .with_proxy_factory(RefusingFactory)
        .init()
        .unwrap();

    assert!(matches!(
        client.request_method("doesNotExist"),
        Err(RequestError::NoSuchMethod { .. })
    ));
    assert!(matches!(
        client.request_method("getWeather"),
        Err(RequestError::Proxy(_))
    ));
}

#[test]
fn test_interface_without_methods_cannot_bind_by_default() {
    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "weather.wsdl");
    let model = GeneratedModel {
        interfaces: vec![interface("EmptyPort", "weather.EmptyPort")],
        services: vec![service("WeatherService", "weather.WeatherService")],
    };
    let client = WebServiceClient::new(address, config(tmp.path()))
        .with_generator(SourceGenerator::new(
            vec![("weather.proto", common::WEATHER_PROTO)],
            model,
        ))
        .with_toolchain(PrebuiltToolchain::new(weather_descriptor_set()))
        .with_proxy_factory(ForecastFactory::default())
        .init()
        .unwrap();

    assert!(matches!(
        client.request(),
        Err(RequestError::NoSuchMethod { method: None, .. })
    ));
}

#[test]
fn test_unknown_names_are_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let client = weather_client(tmp.path());

    assert!(matches!(
        client.request_with("WeatherPort", "Nope", None),
        Err(RequestError::NotFound {
            kind: SymbolKind::Service,
            ..
        })
    ));
    assert!(matches!(
        client.request_with("Nope", "WeatherService", None),
        Err(RequestError::NotFound {
            kind: SymbolKind::Interface,
            ..
        })
    ));
}

#[test]
fn test_each_request_creates_its_own_proxy() {
    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "weather.wsdl");
    let factory = ForecastFactory::default();
    let client = WebServiceClient::new(address, config(tmp.path()))
        .with_generator(SourceGenerator::weather())
        .with_toolchain(PrebuiltToolchain::new(weather_descriptor_set()))
        .with_proxy_factory(factory.clone())
        .init()
        .unwrap();

    let _first = client.request().unwrap();
    let _second = client.request_method("getWeather").unwrap();

    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
}

#[test]
fn test_remote_faults_are_invocation_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let client = weather_client(tmp.path());
    let mut invoker = client.request().unwrap();

    let err = invoker.invoke(vec![serde_json::json!("")]).unwrap_err();

    assert!(matches!(err, InvocationError::Remote { .. }));
    assert!(err.to_string().contains("city is required"));
}

#[test]
fn test_empty_descriptor_has_nothing_to_request() {
    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "empty.wsdl");
    let client = WebServiceClient::new(address, config(tmp.path()))
        .with_generator(SourceGenerator::new(vec![], GeneratedModel::default()))
        .with_toolchain(PrebuiltToolchain::failing("never called"))
        .with_proxy_factory(ForecastFactory::default())
        .init()
        .unwrap();

    assert!(client.interfaces().is_empty());
    assert!(matches!(
        client.request(),
        Err(RequestError::Empty {
            kind: SymbolKind::Interface
        })
    ));
}

#[test]
fn test_clients_are_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let weather = weather_client(tmp.path());

    let echo_address = descriptor_address(tmp.path(), "echo.wsdl");
    let echo = WebServiceClient::new(echo_address, config(tmp.path()))
        .with_generator(SourceGenerator::new(
            vec![("echo.proto", echo_service::PROTO_SOURCE)],
            echo_model(),
        ))
        .with_toolchain(PrebuiltToolchain::new(
            echo_service::FILE_DESCRIPTOR_SET.to_vec(),
        ))
        .with_proxy_factory(ForecastFactory::default())
        .init()
        .unwrap();

    assert_ne!(weather.workspace().root(), echo.workspace().root());
    assert!(!weather.workspace().root().starts_with(echo.workspace().root()));

    let weather_pool = weather.registry().pool();
    let echo_pool = echo.registry().pool();
    assert!(weather_pool.get_service_by_name("weather.WeatherPort").is_some());
    assert!(weather_pool.get_service_by_name("echo.EchoPort").is_none());
    assert!(echo_pool.get_service_by_name("echo.EchoPort").is_some());
    assert!(echo_pool.get_service_by_name("weather.WeatherPort").is_none());
}

#[test]
fn test_reinitializing_reuses_the_workspace() {
    let tmp = tempfile::tempdir().unwrap();

    let first = weather_client(tmp.path());
    let second = weather_client(tmp.path());

    assert_eq!(first.workspace(), second.workspace());
    assert_eq!(second.interfaces(), vec!["WeatherPort"]);
}

#[test]
fn test_ready_client_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebServiceClient<Ready>>();

    let tmp = tempfile::tempdir().unwrap();
    let client = weather_client(tmp.path());

    std::thread::scope(|scope| {
        for city in ["Paris", "Lyon"] {
            let client = &client;
            scope.spawn(move || {
                let mut invoker = client.request().unwrap();
                let result = invoker.invoke(vec![serde_json::json!(city)]).unwrap();
                assert_eq!(
                    result.value(),
                    Some(serde_json::json!(format!("Sunny in {city}")))
                );
            });
        }
    });
}

#[test]
fn test_service_address_override() {
    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "weather.wsdl");
    let config = ClientConfig {
        service_address: Some("http://127.0.0.1:50051".to_string()),
        ..config(tmp.path())
    };

    let client = WebServiceClient::new(address.clone(), config)
        .with_generator(SourceGenerator::weather())
        .with_toolchain(PrebuiltToolchain::new(weather_descriptor_set()))
        .with_proxy_factory(ForecastFactory::default())
        .init()
        .unwrap();

    assert_eq!(client.address(), address);
    assert_eq!(client.service_address(), "http://127.0.0.1:50051");
}

#[test]
fn test_unreachable_descriptor_aborts_init() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing.wsdl");

    let err = WebServiceClient::new(missing.to_str().unwrap(), config(tmp.path()))
        .with_generator(SourceGenerator::weather())
        .init()
        .err()
        .unwrap();

    assert!(matches!(err, InitError::Descriptor(ref e) if e.is_unreachable()));
}

#[test]
fn test_generator_rejection_aborts_init() {
    struct Rejecting;

    impl wsreq_core::descriptor::Generator for Rejecting {
        fn generate(
            &self,
            _request: wsreq_core::descriptor::GenerateRequest<'_>,
        ) -> Result<GeneratedModel, wsreq_core::descriptor::GenerateError> {
            Err(wsreq_core::descriptor::GenerateError::Other(
                "no portType".into(),
            ))
        }
    }

    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "weather.wsdl");

    let err = WebServiceClient::new(address, config(tmp.path()))
        .with_generator(Rejecting)
        .init()
        .err()
        .unwrap();

    assert!(matches!(
        err,
        InitError::Descriptor(DescriptorError::Malformed { .. })
    ));
}

#[test]
fn test_compile_failure_aborts_init_with_diagnostics() {
    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "weather.wsdl");

    let err = WebServiceClient::new(address, config(tmp.path()))
        .with_generator(SourceGenerator::weather())
        .with_toolchain(PrebuiltToolchain::failing("Expected \";\"."))
        .init()
        .err()
        .unwrap();

    assert!(matches!(err, InitError::Compile(CompileError::Failed { .. })));
    let message = err.to_string();
    assert!(message.contains("weather.proto"), "{message}");
    assert!(message.contains("Expected \";\"."), "{message}");
}

#[test]
fn test_generator_and_compiler_mismatch_aborts_init() {
    let tmp = tempfile::tempdir().unwrap();
    let address = descriptor_address(tmp.path(), "weather.wsdl");

    let err = WebServiceClient::new(address, config(tmp.path()))
        .with_generator(SourceGenerator::new(
            vec![("weather.proto", common::WEATHER_PROTO)],
            weather_model(),
        ))
        .with_toolchain(PrebuiltToolchain::new(
            echo_service::FILE_DESCRIPTOR_SET.to_vec(),
        ))
        .init()
        .err()
        .unwrap();

    assert!(matches!(
        err,
        InitError::Load(LoadError::Missing { ref name, .. }) if name == "WeatherPort"
    ));
}
