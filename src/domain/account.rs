use crate::error::{ConnectorError, Result};
use std::fmt;

/// A structurally valid IBAN (ISO 13616), stored without spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iban(String);

impl Iban {
    /// Validates length, country code, check digits and the mod-97 checksum.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            ConnectorError::ValidationError(format!("invalid IBAN {}: {}", raw, reason))
        };

        if !(15..=34).contains(&raw.len()) {
            return Err(invalid("wrong length"));
        }
        let bytes = raw.as_bytes();
        if !bytes[..2].iter().all(u8::is_ascii_uppercase) {
            return Err(invalid("missing country code"));
        }
        if !bytes[2..4].iter().all(u8::is_ascii_digit) {
            return Err(invalid("missing check digits"));
        }
        if !bytes[4..]
            .iter()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
        {
            return Err(invalid("unexpected character"));
        }

        // Move the first four characters to the end, read letters as 10..35.
        let remainder = raw[4..]
            .chars()
            .chain(raw[..4].chars())
            .fold(0u32, |acc, c| match c.to_digit(36) {
                Some(v) if v >= 10 => (acc * 100 + v) % 97,
                Some(v) => (acc * 10 + v) % 97,
                None => acc,
            });
        if remainder != 1 {
            return Err(invalid("checksum mismatch"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The ledger accounts held by one customer IBAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub conversion_account_id: i64,
    pub disposal_account_id: i64,
    /// Flags set on the account, e.g. a blocking order.
    pub flags: Vec<String>,
}

/// Whether a customer can be credited, reported to the orchestrator as `accountAmsStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAmsStatus {
    ReadyToReceiveMoney,
    NotReadyToReceiveMoney,
}

impl AccountAmsStatus {
    /// Ready only for a known account with no flags set.
    pub fn of(record: Option<&AccountRecord>) -> Self {
        match record {
            Some(record) if record.flags.is_empty() => AccountAmsStatus::ReadyToReceiveMoney,
            _ => AccountAmsStatus::NotReadyToReceiveMoney,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountAmsStatus::ReadyToReceiveMoney => "READY_TO_RECEIVE_MONEY",
            AccountAmsStatus::NotReadyToReceiveMoney => "NOT_READY_TO_RECEIVE_MONEY",
        }
    }
}
