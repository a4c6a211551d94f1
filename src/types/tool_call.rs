use serde::{Deserialize, Serialize};

/// A function call requested by the model, as stored in conversation history.
///
/// The `index` is the position the server assigned while streaming; it is kept
/// for reporting and is not part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Stream position of this call within the response.
    #[serde(skip)]
    pub index: u32,

    /// Server-assigned identifier of the call.
    #[serde(default)]
    pub id: String,

    /// The type of the call, always "function".
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,

    /// The function being invoked.
    pub function: ToolCallFunction,
}

/// Name and raw JSON arguments of a function call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// The function name.
    #[serde(default)]
    pub name: String,

    /// The arguments, as the JSON text the model produced.
    #[serde(default)]
    pub arguments: String,
}

fn default_type() -> String {
    "function".to_string()
}

impl ToolCall {
    /// Creates a new function call.
    pub fn new(
        index: u32,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            index,
            id: id.into(),
            kind: default_type(),
            function: ToolCallFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_omits_index() {
        let call = ToolCall::new(3, "call_1", "lookup", r#"{"q":"rust"}"#);
        let json = serde_json::to_string(&call).unwrap();
        assert_eq!(
            json,
            r#"{"id":"call_1","type":"function","function":{"name":"lookup","arguments":"{\"q\":\"rust\"}"}}"#
        );
    }

    #[test]
    fn deserialization_fills_defaults() {
        let call: ToolCall = serde_json::from_str(r#"{"function":{"name":"f"}}"#).unwrap();
        assert_eq!(call.kind, "function");
        assert_eq!(call.function.name, "f");
        assert!(call.function.arguments.is_empty());
        assert_eq!(call.index, 0);
    }
}
