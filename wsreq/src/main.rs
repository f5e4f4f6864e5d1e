//! # wsreq CLI Entry Point
//!
//! The main executable for the wsreq tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and resolves the
//!    [`ClientConfig`](wsreq_core::config::ClientConfig) from the config file and flags.
//! 2. **Pipeline**: Builds a `WebServiceClient` for the descriptor address (generation,
//!    compilation and loading all happen here).
//! 3. **Execution**: Lists, describes or calls the declared operations.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.

mod cli;
mod config;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands, ListCommands};
use formatter::{FormattedString, InterfaceMethods, NameList};
use std::process;
use tracing_subscriber::EnvFilter;
use wsreq_core::client::{Ready, WebServiceClient};

fn main() {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let config = match config::resolve(&args) {
        Ok(config) => config,
        Err(err) => exit_with(err),
    };

    let client = match WebServiceClient::new(args.address, config).init() {
        Ok(client) => client,
        Err(err) => exit_with(err),
    };

    match args.command {
        Commands::List { sub } => match sub {
            ListCommands::Interfaces => list("interfaces", client.interfaces()),
            ListCommands::Services => list("services", client.services()),
        },
        Commands::Describe { interface } => describe(&client, interface),
        Commands::Call {
            method,
            args,
            body,
            interface,
            service,
        } => call(&client, method, args, body, interface.zip(service)),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with(err: impl Into<FormattedString>) -> ! {
    eprintln!("{}", err.into());
    process::exit(1);
}

fn list(kind: &'static str, names: Vec<&str>) {
    let names = names.into_iter().map(str::to_string).collect();
    println!("{}", FormattedString::from(NameList(kind, names)));
}

fn describe(client: &WebServiceClient<Ready>, interface: String) {
    match client.methods(&interface) {
        Ok(methods) => println!(
            "{}",
            FormattedString::from(InterfaceMethods(interface, methods))
        ),
        Err(err) => exit_with(err),
    }
}

fn call(
    client: &WebServiceClient<Ready>,
    method: Option<String>,
    args: Vec<serde_json::Value>,
    body: Option<serde_json::Value>,
    target: Option<(String, String)>,
) {
    let requested = match (&target, method.as_deref()) {
        (Some((interface, service)), method) => client.request_with(interface, service, method),
        (None, Some(method)) => client.request_method(method),
        (None, None) => client.request(),
    };

    let mut invoker = match requested {
        Ok(invoker) => invoker,
        Err(err) => exit_with(err),
    };

    let result = match body {
        Some(body) => invoker.invoke_message(body),
        None => invoker.invoke(args),
    };

    match result.map(|result| result.to_json()) {
        Ok(Ok(value)) => println!("{}", FormattedString::from(value)),
        Ok(Err(err)) => exit_with(anyhow::Error::from(err)),
        Err(err) => exit_with(err),
    }
}
