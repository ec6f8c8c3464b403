use chrono::TimeZone;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::errors::BridgeError;
use crate::core::units;

/// Storage key holding the last known on-chain transaction count.
pub const TRANSACTION_COUNT_KEY: &str = "transactionCount";

/// Fields of the transfer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    AddressTo,
    Amount,
    Keyword,
    Message,
}

impl FromStr for FormField {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addressTo" | "address_to" | "to" => Ok(FormField::AddressTo),
            "amount" => Ok(FormField::Amount),
            "keyword" => Ok(FormField::Keyword),
            "message" => Ok(FormField::Message),
            other => Err(BridgeError::InvalidInput(format!("Unknown form field: {}", other))),
        }
    }
}

/// Transfer form as typed by the user. Values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFormData {
    pub address_to: String,
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

impl TransactionFormData {
    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::AddressTo => self.address_to = value,
            FormField::Amount => self.amount = value,
            FormField::Keyword => self.keyword = value,
            FormField::Message => self.message = value,
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::AddressTo => &self.address_to,
            FormField::Amount => &self.amount,
            FormField::Keyword => &self.keyword,
            FormField::Message => &self.message,
        }
    }
}

/// A transfer record exactly as the contract returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub sender: String,
    pub receiver: String,
    pub amount: U256,
    pub message: String,
    pub timestamp: U256,
    pub keyword: String,
}

/// Display form of a transfer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub address_from: String,
    pub address_to: String,
    pub timestamp: String,
    pub message: String,
    pub keyword: String,
    pub amount: f64,
}

impl TransactionRecord {
    /// Normalizes a raw record. Addresses keep the casing they came with.
    pub fn from_raw<Tz>(raw: &RawTransaction, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            address_from: raw.sender.clone(),
            address_to: raw.receiver.clone(),
            timestamp: units::format_timestamp(raw.timestamp, tz),
            message: raw.message.clone(),
            keyword: raw.keyword.clone(),
            amount: units::to_display_amount(raw.amount),
        }
    }
}

/// Snapshot of everything the bridge exposes to its consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeState {
    pub current_account: Option<String>,
    pub form: TransactionFormData,
    pub is_loading: bool,
    pub transaction_count: Option<u64>,
    pub transactions: Vec<TransactionRecord>,
}
