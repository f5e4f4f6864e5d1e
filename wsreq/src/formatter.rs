use colored::*;
use wsreq_core::{
    client::{InitError, RequestError},
    invoker::InvocationError,
    registry::MethodSignature,
};

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct NameList(pub &'static str, pub Vec<String>);

pub struct InterfaceMethods(pub String, pub Vec<MethodSignature>);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<InitError> for FormattedString {
    fn from(err: InitError) -> Self {
        let title = match err {
            InitError::Workspace { .. } => "Workspace Error:",
            InitError::Descriptor(ref e) if e.is_unreachable() => "Descriptor Unreachable:",
            InitError::Descriptor(_) => "Descriptor Rejected:",
            InitError::Compile(_) => "Compilation Failed:",
            InitError::Load(_) => "Loading Failed:",
            InitError::Transport(_) => "Transport Error:",
        };
        FormattedString(format!("{}\n\n'{}'", title.red().bold(), err))
    }
}

impl From<RequestError> for FormattedString {
    fn from(err: RequestError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Symbol Lookup Failed:".red().bold(),
            err
        ))
    }
}

impl From<InvocationError> for FormattedString {
    fn from(err: InvocationError) -> Self {
        let title = match err {
            InvocationError::InvalidArguments { .. } => "Invalid Arguments:",
            InvocationError::Remote { .. } => "Call Failed:",
        };
        FormattedString(format!("{}\n\n'{}'", title.red().bold(), err))
    }
}

impl From<anyhow::Error> for FormattedString {
    fn from(err: anyhow::Error) -> Self {
        FormattedString(format!("{}\n\n'{:#}'", "Error:".red().bold(), err))
    }
}

impl From<NameList> for FormattedString {
    fn from(NameList(kind, names): NameList) -> Self {
        if names.is_empty() {
            return FormattedString(format!("No {kind} found.").yellow().to_string());
        }

        let mut out = format!("Available {kind}:\n");
        for name in names {
            out.push_str(&format!("  - {}\n", name.green()));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<MethodSignature> for FormattedString {
    fn from(signature: MethodSignature) -> Self {
        let params = signature
            .parameters
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty.yellow()))
            .collect::<Vec<_>>()
            .join(", ");

        FormattedString(format!(
            "{}({}) -> {}",
            signature.name.green(),
            params,
            signature.returns.yellow()
        ))
    }
}

impl From<InterfaceMethods> for FormattedString {
    fn from(InterfaceMethods(interface, methods): InterfaceMethods) -> Self {
        let mut out = format!("{} {} {{\n", "interface".cyan(), interface.green());

        for method in methods {
            let input = method.input.clone();
            let output = method.output.clone();
            out.push_str("  ");
            out.push_str(&FormattedString::from(method).0);
            out.push_str(&format!(
                "\n    {} {} {} {}\n\n",
                "in".cyan(),
                input,
                "out".cyan(),
                output
            ));
        }
        out.push('}');
        FormattedString(out)
    }
}
