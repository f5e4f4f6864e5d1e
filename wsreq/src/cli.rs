//! # CLI
//!
//! This module defines the command-line interface of `wsreq` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring arguments are valid JSON).
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wsreq",
    version,
    about = "Call web services from their descriptor, no codegen step"
)]
pub struct Cli {
    /// The descriptor address (e.g. http://example.org/svc?wsdl or a local file)
    pub address: String,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory under which per-endpoint workspaces are created
    #[arg(long, global = true)]
    pub workspace_root: Option<PathBuf>,

    /// Extra include directory for the compiler (repeatable)
    #[arg(short = 'I', long = "include", global = true)]
    pub include_paths: Vec<PathBuf>,

    /// Path of the protoc executable
    #[arg(long, global = true)]
    pub protoc: Option<PathBuf>,

    /// Descriptor generator program
    #[arg(long, global = true)]
    pub generator: Option<PathBuf>,

    /// Extra argument passed to the generator before its own (repeatable)
    #[arg(long = "generator-arg", global = true, allow_hyphen_values = true)]
    pub generator_args: Vec<String>,

    /// Address the calls are sent to, when it differs from the descriptor address
    #[arg(long, global = true)]
    pub service_address: Option<String>,

    /// Log every pipeline stage
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the interfaces or services declared by the descriptor
    List {
        #[command(subcommand)]
        sub: ListCommands,
    },

    /// Describe the methods of an interface
    Describe {
        /// Interface name (e.g. WeatherPort)
        interface: String,
    },

    /// Call a remote method
    ///
    /// Without `--interface`/`--service` the first declared ones are used. Without a method
    /// name the first declared method is called.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// wsreq http://example.org/svc?wsdl call getWeather '"Paris"'
    /// wsreq ./weather.wsdl call --interface WeatherPort --service WeatherService getWeather --body '{"city": "Paris"}'
    /// ```
    Call {
        /// Method name (e.g. getWeather)
        method: Option<String>,

        /// Positional arguments, each one a JSON value
        #[arg(value_parser = parse_json, conflicts_with = "body")]
        args: Vec<serde_json::Value>,

        /// The whole input message as a JSON object
        #[arg(long, value_parser = parse_json)]
        body: Option<serde_json::Value>,

        #[arg(long, requires = "service")]
        interface: Option<String>,

        #[arg(long, requires = "interface")]
        service: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// List declared interfaces
    Interfaces,
    /// List declared services
    Services,
}

fn parse_json(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))
}
