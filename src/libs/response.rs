//! Command outcomes for people and for scripts.
//!
//! In JSON mode every command prints exactly one envelope,
//! `{"success": bool, "message": string, "data": ...}`, on stdout and nothing
//! else. Otherwise results are drawn as tables and followed by a status line.

use crate::libs::messages::Message;
use crate::{msg_error, msg_info, msg_success};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn ok(message: impl ToString, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data,
        }
    }

    pub fn failure(message: impl ToString) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Responder {
    json: bool,
}

impl Responder {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// A finished operation without a payload.
    pub fn done(&self, message: Message) -> Result<()> {
        if self.json {
            println!("{}", ApiResponse::ok(message, None).to_json()?);
        } else {
            msg_success!(message);
        }
        Ok(())
    }

    /// A finished operation with a payload; `render` draws it on screen.
    pub fn data<T: Serialize>(&self, message: Message, data: &T, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", ApiResponse::ok(message, Some(serde_json::to_value(data)?)).to_json()?);
        } else {
            render(data);
            msg_success!(message);
        }
        Ok(())
    }

    /// A listing. Empty listings print `empty` instead of a table.
    pub fn list<T: Serialize>(&self, message: Message, empty: Message, items: &[T], render: impl FnOnce(&[T])) -> Result<()> {
        if self.json {
            println!("{}", ApiResponse::ok(message, Some(serde_json::to_value(items)?)).to_json()?);
        } else if items.is_empty() {
            msg_info!(empty);
        } else {
            render(items);
            msg_info!(message);
        }
        Ok(())
    }

    pub fn fail(&self, err: &anyhow::Error) {
        if self.json {
            match ApiResponse::failure(err).to_json() {
                Ok(envelope) => println!("{}", envelope),
                Err(_) => msg_error!(err),
            }
        } else {
            msg_error!(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_is_omitted_when_absent() {
        let json = ApiResponse::failure("unknown course").to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "unknown course");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn ok_carries_payload() {
        let response = ApiResponse::ok("done", Some(serde_json::json!({"accepted": 1})));
        assert!(response.success);
        assert_eq!(response.data.unwrap()["accepted"], 1);
    }
}
