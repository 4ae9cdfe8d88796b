//! Wire format: one JSON object per line.
//!
//! ```text
//! → {"id":1,"method":"ExecStateManager.Display","params":[{}]}
//! ← {"id":1,"result":{"flags":2147483649},"error":null}
//! ```
//!
//! Both `result` and `error` are always present; exactly one is non-null.

use crate::service::{Method, SERVICE_NAME};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl Request {
    /// Request for `method` with the empty argument object.
    #[must_use]
    pub fn new(id: u64, method: Method) -> Self {
        Self {
            id,
            method: method.wire_name(),
            params: vec![Value::Object(serde_json::Map::new())],
        }
    }

    /// Resolves the method name.
    ///
    /// The error text follows the conventional `rpc:` messages so clients
    /// can tell a typo from a service failure.
    pub fn resolve_method(&self) -> Result<Method, String> {
        let Some((service, name)) = self.method.split_once('.') else {
            return Err(format!(
                "rpc: service/method request ill-formed: {}",
                self.method
            ));
        };
        if service != SERVICE_NAME {
            return Err(format!("rpc: can't find service {}", self.method));
        }
        Method::from_wire(&self.method).ok_or_else(|| format!("rpc: can't find method {service}.{name}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl Response {
    #[must_use]
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn err(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Serializes `msg` as a single newline-terminated line.
pub fn encode_line<T: Serialize>(msg: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}
