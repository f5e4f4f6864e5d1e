use prost_reflect::{
    EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor, MethodDescriptor, ServiceDescriptor,
};
use std::fmt;

/// A loaded definition of any kind.
///
/// Service bindings may be generated as any top-level definition, so the registry keeps them
/// as a `Symbol` rather than assuming a service definition.
#[derive(Debug, Clone)]
pub enum Symbol {
    Service(ServiceDescriptor),
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
}

impl Symbol {
    /// Returns the name (e.g.,`WeatherService`) of the inner descriptor
    pub fn name(&self) -> &str {
        match self {
            Symbol::Service(v) => v.name(),
            Symbol::Message(v) => v.name(),
            Symbol::Enum(v) => v.name(),
        }
    }

    /// Returns the full_name (e.g.,`weather.v1.WeatherService`) of the inner descriptor
    pub fn full_name(&self) -> &str {
        match self {
            Symbol::Service(v) => v.full_name(),
            Symbol::Message(v) => v.full_name(),
            Symbol::Enum(v) => v.full_name(),
        }
    }
}

/// Human readable shape of a remote operation, e.g. `getWeather(city: string) -> string`.
///
/// Parameters are the input message fields in declaration order. When the output message has
/// exactly one field its type is reported as the return type, otherwise the message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub parameters: Vec<(String, String)>,
    pub returns: String,
    /// Fully qualified input message name.
    pub input: String,
    /// Fully qualified output message name.
    pub output: String,
}

impl From<&MethodDescriptor> for MethodSignature {
    fn from(method: &MethodDescriptor) -> Self {
        let input = method.input();
        let output = method.output();

        let parameters = input
            .fields()
            .map(|field| (field.name().to_string(), type_name(&field)))
            .collect();

        let mut output_fields = output.fields();
        let returns = match (output_fields.next(), output_fields.next()) {
            (Some(only), None) => type_name(&only),
            _ => output.full_name().to_string(),
        };

        Self {
            name: method.name().to_string(),
            parameters,
            returns,
            input: input.full_name().to_string(),
            output: output.full_name().to_string(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (name, ty)) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {ty}")?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

fn type_name(field: &FieldDescriptor) -> String {
    if field.is_map()
        && let Kind::Message(entry) = field.kind()
    {
        return format!(
            "map<{}, {}>",
            kind_name(&entry.map_entry_key_field().kind()),
            kind_name(&entry.map_entry_value_field().kind())
        );
    }

    let base = kind_name(&field.kind());
    if field.is_list() {
        format!("repeated {base}")
    } else {
        base
    }
}

fn kind_name(kind: &Kind) -> String {
    match kind {
        Kind::Double => "double".into(),
        Kind::Float => "float".into(),
        Kind::Int32 => "int32".into(),
        Kind::Int64 => "int64".into(),
        Kind::Uint32 => "uint32".into(),
        Kind::Uint64 => "uint64".into(),
        Kind::Sint32 => "sint32".into(),
        Kind::Sint64 => "sint64".into(),
        Kind::Fixed32 => "fixed32".into(),
        Kind::Fixed64 => "fixed64".into(),
        Kind::Sfixed32 => "sfixed32".into(),
        Kind::Sfixed64 => "sfixed64".into(),
        Kind::Bool => "bool".into(),
        Kind::String => "string".into(),
        Kind::Bytes => "bytes".into(),
        Kind::Message(m) => m.full_name().into(),
        Kind::Enum(e) => e.full_name().into(),
    }
}
