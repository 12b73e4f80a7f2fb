use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::domain::{
    customer::{Customer, CustomerId},
    Entity, SortOrder,
};

use super::SoapError;

pub const NAME_MIN_LEN: usize = 4;
pub const NAME_MAX_LEN: usize = 150;
pub const NAME_PATTERN: &str = "[a-z0-9.]+";

// XSD patterns match the whole value.
static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^(?:{})$", NAME_PATTERN)).expect("valid name pattern"));

/// SOAPの顧客型 (`tns:CustomerSchema`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerSchema {
    #[serde(rename = "tns:id")]
    pub id: u32,
    #[serde(rename = "tns:name")]
    pub name: String,
}

impl From<Customer> for CustomerSchema {
    fn from(value: Customer) -> Self {
        Self {
            id: *value.id(),
            name: value.name().to_owned(),
        }
    }
}

/// `tns:CustomerSchemaArray`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerSchemaArray {
    #[serde(rename = "tns:CustomerSchema")]
    pub items: Vec<CustomerSchema>,
}

/// 名前の長さ(文字数)とパターンを検証する
pub fn validate_name(name: &str) -> Result<(), SoapError> {
    let len = name.chars().count();
    if len < NAME_MIN_LEN || len > NAME_MAX_LEN {
        return Err(SoapError::Validation(format!(
            "name must be between {} and {} characters, got {}",
            NAME_MIN_LEN, NAME_MAX_LEN, len
        )));
    }
    if !NAME_REGEX.is_match(name) {
        return Err(SoapError::Validation(format!(
            "name '{}' does not match pattern {}",
            name, NAME_PATTERN
        )));
    }
    Ok(())
}

/// 文字列で届いた顧客IDを数値に変換する
pub fn parse_customer_id(value: &str) -> Result<CustomerId, SoapError> {
    value
        .parse::<u32>()
        .map(CustomerId::from)
        .map_err(|_| SoapError::Validation(format!("customer_id '{}' is not a valid id", value)))
}

pub fn parse_order_by(value: Option<&str>) -> Result<SortOrder, SoapError> {
    match value {
        None => Ok(SortOrder::default()),
        Some(v) => v
            .parse()
            .map_err(|e: crate::domain::UnknownSortOrder| SoapError::Validation(e.to_string())),
    }
}
