// Tool registry: static descriptors mapping tool names to backend routes

use crate::protocol::ToolSchema;
use finpilot_core::Route;
use serde_json::Value;

/// Expected JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Object,
    /// Array whose items are objects
    ObjectArray,
}

impl ParamKind {
    /// Shallow type check; no business validation
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Object => value.is_object(),
            Self::ObjectArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Object => "an object",
            Self::ObjectArray => "an array of objects",
        }
    }

    fn schema(&self, description: &str) -> Value {
        match self {
            Self::String => json_schema_string(description),
            Self::Object => json_schema_object_any(description),
            Self::ObjectArray => json_schema_array(json_schema_object_any("Item"), description),
        }
    }
}

/// One declared parameter of a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    /// Left out of the gateway body when absent, instead of sent as `null`
    pub omit_when_absent: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            omit_when_absent: false,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            omit_when_absent: false,
            description,
        }
    }

    pub const fn omit_when_absent(mut self) -> Self {
        self.omit_when_absent = true;
        self
    }
}

/// Static description of a tool: its name, parameters and backend route
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub route: Route,
}

impl ToolDescriptor {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Get the tool schema for MCP
    pub fn schema(&self) -> ToolSchema {
        let properties: serde_json::Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.kind.schema(p.description)))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        let mut input_schema = json_schema_object(Value::Object(properties), required);
        input_schema["additionalProperties"] = Value::Bool(false);

        ToolSchema {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema,
        }
    }
}

/// Tool registry, built once at startup and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every FinPilot tool
    pub fn finpilot() -> Self {
        let mut registry = Self::new();
        for tool in super::finpilot_tools() {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: ToolDescriptor) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name == tool.name) {
            tracing::warn!(tool = tool.name, "Replacing previously registered tool");
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Get a tool by name
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// List all tool schemas, in registration order
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(ToolDescriptor::schema).collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.iter().map(|t| t.name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_object_any(description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "description": description
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}
