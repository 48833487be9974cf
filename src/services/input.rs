//! Boundary parsing for the untyped values the request layer hands over.

use serde::Serialize;
use serde_json::Value;

use super::errors::ServiceError;

pub const MAX_USERNAME_LEN: usize = 64;

/// A validated, case-sensitive username. Stored exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        if raw.trim().is_empty() {
            return Err(ServiceError::invalid("Username is required"));
        }

        if raw.chars().count() > MAX_USERNAME_LEN {
            return Err(ServiceError::invalid(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A positive number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const MAX: i64 = u32::MAX as i64;

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        Self::try_from(parse_integer("quantity", raw)?)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = ServiceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(ServiceError::invalid("Quantity must be a positive integer"));
        }

        if value > Self::MAX {
            return Err(ServiceError::invalid(format!(
                "Quantity must not exceed {}",
                Self::MAX
            )));
        }

        Ok(Self(value))
    }
}

pub fn parse_medicine_id(raw: &str) -> Result<i64, ServiceError> {
    parse_integer("medicine_id", raw)
}

fn parse_integer(field: &str, raw: &str) -> Result<i64, ServiceError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ServiceError::invalid(format!("{} is required", field)));
    }

    trimmed
        .parse::<i64>()
        .map_err(|_| ServiceError::invalid(format!("{} must be an integer, got '{}'", field, trimmed)))
}

/// Purchase payload as typed values. `quantity` is range-checked by the
/// transaction processor, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRequest {
    pub username: String,
    pub medicine_id: i64,
    pub quantity: i64,
}

impl PurchaseRequest {
    /// Reads `{"username", "medicine_id", "quantity"}` from an arbitrary JSON value.
    ///
    /// Integers may arrive as JSON numbers or numeric strings. A missing or null
    /// `quantity` means one unit.
    pub fn from_json(payload: &Value) -> Result<Self, ServiceError> {
        let object = payload
            .as_object()
            .ok_or_else(|| ServiceError::invalid("Request body must be a JSON object"))?;

        let username = match object.get("username") {
            Some(Value::String(username)) if !username.trim().is_empty() => username.clone(),
            _ => return Err(ServiceError::invalid("Username and medicine_id required")),
        };

        let medicine_id = match object.get("medicine_id") {
            None | Some(Value::Null) => {
                return Err(ServiceError::invalid("Username and medicine_id required"))
            }
            Some(value) => integer_field("medicine_id", value)?,
        };

        let quantity = match object.get("quantity") {
            None | Some(Value::Null) => 1,
            Some(value) => integer_field("quantity", value)?,
        };

        Ok(Self {
            username,
            medicine_id,
            quantity,
        })
    }
}

fn integer_field(field: &str, value: &Value) -> Result<i64, ServiceError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| ServiceError::invalid(format!("{} must be an integer", field))),
        Value::String(raw) => parse_integer(field, raw),
        _ => Err(ServiceError::invalid(format!("{} must be an integer", field))),
    }
}
