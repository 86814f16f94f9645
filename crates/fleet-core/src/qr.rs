//! # QR Payloads
//!
//! Terminals carry a printed QR code. Two payload shapes are in circulation:
//!
//! ```text
//!   "ABC123"            the terminal's qr_code, verbatim
//!   "terminal_id:T1"    the dashboard's generated convention
//! ```
//!
//! A scan is resolved by trying lookups in order until one hits:
//!
//! ```text
//!   ┌──────────────────────┐   miss   ┌──────────────────────────┐
//!   │ qr_code == payload   │ ───────► │ terminal_id == <id>      │ (prefixed only)
//!   └──────────────────────┘          └────────────┬─────────────┘
//!                                                   │ miss
//!                                     ┌─────────────▼────────────┐
//!                                     │ document id == <id>      │ (prefixed only)
//!                                     └─────────────┬────────────┘
//!                                                   │ miss
//!                                     ┌─────────────▼────────────┐
//!                                     │ terminal_id == payload   │
//!                                     └──────────────────────────┘
//! ```
//!
//! This module only builds the plan; the store executes it.

use crate::error::ValidationError;

/// Prefix of generated QR payloads.
pub const TERMINAL_ID_PREFIX: &str = "terminal_id:";

/// A trimmed, non-empty scanned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    raw: String,
}

/// One lookup step of QR resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalLookup {
    /// Exact match on the `qr_code` field.
    ByQrCode(String),
    /// Exact match on the `terminal_id` field.
    ByTerminalId(String),
    /// Direct document id fetch.
    ByDocumentId(String),
}

impl QrPayload {
    /// Parses a scanned string.
    ///
    /// ## Errors
    /// [`ValidationError::Required`] when the payload is blank.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let raw = code.trim();
        if raw.is_empty() {
            return Err(ValidationError::Required {
                field: "qr_code".to_string(),
            });
        }
        Ok(QrPayload {
            raw: raw.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The id after `terminal_id:`, if the payload uses that convention.
    pub fn prefixed_id(&self) -> Option<&str> {
        self.raw
            .strip_prefix(TERMINAL_ID_PREFIX)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Ordered lookups to try for this payload.
    pub fn lookups(&self) -> Vec<TerminalLookup> {
        let mut plan = vec![TerminalLookup::ByQrCode(self.raw.clone())];
        if let Some(id) = self.prefixed_id() {
            plan.push(TerminalLookup::ByTerminalId(id.to_string()));
            plan.push(TerminalLookup::ByDocumentId(id.to_string()));
        }
        plan.push(TerminalLookup::ByTerminalId(self.raw.clone()));
        plan
    }
}

/// Builds the generated payload for a terminal.
pub fn payload_for(terminal_id: &str) -> String {
    format!("{}{}", TERMINAL_ID_PREFIX, terminal_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_payload_plan() {
        let payload = QrPayload::parse("  ABC123 ").unwrap();
        assert_eq!(payload.as_str(), "ABC123");
        assert_eq!(
            payload.lookups(),
            vec![
                TerminalLookup::ByQrCode("ABC123".to_string()),
                TerminalLookup::ByTerminalId("ABC123".to_string()),
            ]
        );
    }

    #[test]
    fn test_prefixed_payload_plan() {
        let payload = QrPayload::parse("terminal_id:T1").unwrap();
        assert_eq!(payload.prefixed_id(), Some("T1"));
        assert_eq!(
            payload.lookups(),
            vec![
                TerminalLookup::ByQrCode("terminal_id:T1".to_string()),
                TerminalLookup::ByTerminalId("T1".to_string()),
                TerminalLookup::ByDocumentId("T1".to_string()),
                TerminalLookup::ByTerminalId("terminal_id:T1".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_prefix_is_plain() {
        let payload = QrPayload::parse("terminal_id:").unwrap();
        assert_eq!(payload.prefixed_id(), None);
        assert_eq!(payload.lookups().len(), 2);
    }

    #[test]
    fn test_blank_payload_rejected() {
        assert!(matches!(
            QrPayload::parse("   "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_payload_for() {
        assert_eq!(payload_for("T9"), "terminal_id:T9");
    }
}
