//! # Document Module
//!
//! Document request lifecycle types.
//!
//! ```text
//! To Pay ──► To Pick Up ──► Released
//!    │
//!    └─────► Rejected
//! ```
//!
//! Transitions are not validated beyond the status being one of the four
//! known values; staff may overwrite any status with any other.

use crate::error::{CoreError, CoreResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of documents a resident may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    BarangayClearance,
    CertificateOfResidency,
    BusinessPermit,
    IndigencyCertificate,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::BarangayClearance,
        DocumentType::CertificateOfResidency,
        DocumentType::BusinessPermit,
        DocumentType::IndigencyCertificate,
    ];

    /// Code string lưu trong DB và gửi từ form
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::BarangayClearance => "barangay-clearance",
            DocumentType::CertificateOfResidency => "certificate-of-residency",
            DocumentType::BusinessPermit => "business-permit",
            DocumentType::IndigencyCertificate => "indigency-certificate",
        }
    }

    pub fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "barangay-clearance" => Ok(DocumentType::BarangayClearance),
            "certificate-of-residency" => Ok(DocumentType::CertificateOfResidency),
            "business-permit" => Ok(DocumentType::BusinessPermit),
            "indigency-certificate" => Ok(DocumentType::IndigencyCertificate),
            other => Err(CoreError::UnknownDocumentType(other.to_string())),
        }
    }

    /// Price table. Callers never supply a price.
    pub fn price(&self) -> Decimal {
        match self {
            DocumentType::BarangayClearance => Decimal::from(50),
            DocumentType::CertificateOfResidency => Decimal::from(50),
            DocumentType::BusinessPermit => Decimal::from(200),
            DocumentType::IndigencyCertificate => Decimal::ZERO,
        }
    }

    /// Human-readable name for reports
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::BarangayClearance => "Barangay Clearance",
            DocumentType::CertificateOfResidency => "Certificate Of Residency",
            DocumentType::BusinessPermit => "Business Permit",
            DocumentType::IndigencyCertificate => "Indigency Certificate",
        }
    }

    /// Indigency takes a free-text purpose instead of uploaded files
    pub fn takes_purpose(&self) -> bool {
        matches!(self, DocumentType::IndigencyCertificate)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a document request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "To Pay")]
    ToPay,
    #[serde(rename = "To Pick Up")]
    ToPickUp,
    #[serde(rename = "Released")]
    Released,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::ToPay,
        RequestStatus::ToPickUp,
        RequestStatus::Released,
        RequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::ToPay => "To Pay",
            RequestStatus::ToPickUp => "To Pick Up",
            RequestStatus::Released => "Released",
            RequestStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "To Pay" => Ok(RequestStatus::ToPay),
            "To Pick Up" => Ok(RequestStatus::ToPickUp),
            "Released" => Ok(RequestStatus::Released),
            "Rejected" => Ok(RequestStatus::Rejected),
            other => Err(CoreError::UnknownRequestStatus(other.to_string())),
        }
    }

    /// Listing filter: "Default" (or nothing) means every status.
    pub fn parse_filter(raw: Option<&str>) -> CoreResult<Option<Self>> {
        match raw.map(str::trim) {
            None | Some("") | Some("Default") => Ok(None),
            Some(other) => Self::from_str(other).map(Some),
        }
    }

    /// Status every new request starts in, whatever its price.
    pub fn initial() -> Self {
        RequestStatus::ToPay
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Paid => "Paid",
        }
    }

    pub fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "Unpaid" => Ok(PaymentStatus::Unpaid),
            "Paid" => Ok(PaymentStatus::Paid),
            other => Err(CoreError::UnknownPaymentStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requirement payload of a request: slot name → stored file path, or
/// `{"purpose": …}` for indigency certificates. Empty bundles are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirements(BTreeMap<String, String>);

impl Requirements {
    pub const PURPOSE_KEY: &'static str = "purpose";

    pub fn purpose(text: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(Self::PURPOSE_KEY.to_string(), text.to_string());
        Self(map)
    }

    pub fn files(slots: BTreeMap<String, String>) -> Self {
        Self(slots)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_table() {
        assert_eq!(DocumentType::BarangayClearance.price(), dec!(50));
        assert_eq!(DocumentType::CertificateOfResidency.price(), dec!(50));
        assert_eq!(DocumentType::BusinessPermit.price(), dec!(200));
        assert_eq!(DocumentType::IndigencyCertificate.price(), dec!(0));
    }

    #[test]
    fn test_document_type_codes() {
        for doc in DocumentType::ALL {
            assert_eq!(DocumentType::from_str(doc.as_str()), Ok(doc));
        }
        assert!(matches!(
            DocumentType::from_str("passport"),
            Err(CoreError::UnknownDocumentType(_))
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RequestStatus::from_str("To Pick Up"), Ok(RequestStatus::ToPickUp));
        assert_eq!(RequestStatus::initial(), RequestStatus::ToPay);
        assert!(RequestStatus::from_str("to pay").is_err());
        assert_eq!(
            serde_json::to_string(&RequestStatus::ToPickUp).unwrap(),
            "\"To Pick Up\""
        );
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(RequestStatus::parse_filter(None), Ok(None));
        assert_eq!(RequestStatus::parse_filter(Some("Default")), Ok(None));
        assert_eq!(
            RequestStatus::parse_filter(Some("Released")),
            Ok(Some(RequestStatus::Released))
        );
        assert!(RequestStatus::parse_filter(Some("Lost")).is_err());
    }

    #[test]
    fn test_requirements_json() {
        let req = Requirements::purpose("travel");
        assert_eq!(req.to_json().unwrap(), r#"{"purpose":"travel"}"#);
        assert_eq!(req.get("purpose"), Some("travel"));

        let mut slots = BTreeMap::new();
        slots.insert("valid-id".to_string(), "uploads/documents/3/x.png".to_string());
        let files = Requirements::files(slots);
        let parsed = Requirements::from_json(&files.to_json().unwrap()).unwrap();
        assert_eq!(parsed, files);
        assert!(Requirements::default().is_empty());
    }
}
