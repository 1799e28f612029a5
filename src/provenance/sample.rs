// SPDX-License-Identifier: GPL-3.0-only

//! Sample provenance record
//!
//! There is no traceability backend; every lookup resolves to the same
//! demonstration record for a batch of Ashwagandha powder.

use serde::{Deserialize, Serialize};

/// Product code of the sample record
pub const SAMPLE_PRODUCT_ID: &str = "AYR-ASH-2024-001";

/// Full supply-chain history of one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRecord {
    pub product_id: String,
    pub product_name: String,
    pub batch_number: String,
    pub collection: CollectionInfo,
    pub testing: LabTestInfo,
    pub processing: ProcessingInfo,
    pub certifications: Vec<Certification>,
}

/// Where and how the herb was harvested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub collector: String,
    pub location: String,
    pub date: String,
    pub coordinates: Coordinates,
    pub method: String,
    pub weather: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Rough bounding box of India, as used for collector geo checks
    pub fn is_within_india(&self) -> bool {
        (8.4..=37.1).contains(&self.lat) && (68.2..=97.4).contains(&self.lng)
    }
}

/// Laboratory quality test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestInfo {
    pub lab_name: String,
    pub test_date: String,
    pub purity: String,
    pub contaminants: String,
    pub active_compounds: String,
    pub certificate: String,
}

/// Processing and packaging step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInfo {
    pub facility: String,
    pub method: String,
    pub process_date: String,
    pub quality: String,
    pub packaging: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub valid: String,
}

fn cert(name: &str, issuer: &str, valid: &str) -> Certification {
    Certification {
        name: name.to_string(),
        issuer: issuer.to_string(),
        valid: valid.to_string(),
    }
}

/// The demonstration record
pub fn sample_trace() -> TraceRecord {
    TraceRecord {
        product_id: SAMPLE_PRODUCT_ID.to_string(),
        product_name: "Premium Ashwagandha Powder".to_string(),
        batch_number: "PR001".to_string(),
        collection: CollectionInfo {
            collector: "Ravi Kumar".to_string(),
            location: "Kerala Hills, India".to_string(),
            date: "2024-01-15".to_string(),
            coordinates: Coordinates {
                lat: 10.8505,
                lng: 76.2711,
            },
            method: "Hand-picked, Traditional".to_string(),
            weather: "Dry, 28°C".to_string(),
        },
        testing: LabTestInfo {
            lab_name: "Ayur Labs Pvt Ltd".to_string(),
            test_date: "2024-01-16".to_string(),
            purity: "98.5%".to_string(),
            contaminants: "None detected".to_string(),
            active_compounds: "Withanolides: 2.8%".to_string(),
            certificate: "AYL-2024-001".to_string(),
        },
        processing: ProcessingInfo {
            facility: "Green Valley Processing".to_string(),
            method: "Low-temperature drying".to_string(),
            process_date: "2024-01-18".to_string(),
            quality: "Grade A".to_string(),
            packaging: "Eco-friendly sealed pouches".to_string(),
        },
        certifications: vec![
            cert("Organic Certified", "NPOP India", "2025-01-15"),
            cert("GMP Certified", "WHO-GMP", "2024-12-31"),
            cert("AYUSH Approved", "Ministry of AYUSH", "2025-06-30"),
        ],
    }
}

/// Resolve a scanned or typed code to a trace record
///
/// Any non-blank code resolves to the sample record.
pub fn lookup_trace(code: &str) -> Option<TraceRecord> {
    if code.trim().is_empty() {
        None
    } else {
        Some(sample_trace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_serializes_camel_case() {
        let json = serde_json::to_value(sample_trace()).unwrap();
        assert_eq!(json["productId"], "AYR-ASH-2024-001");
        assert_eq!(json["testing"]["activeCompounds"], "Withanolides: 2.8%");
        assert_eq!(json["certifications"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_sample_collection_is_in_india() {
        assert!(sample_trace().collection.coordinates.is_within_india());
        assert!(!Coordinates { lat: 51.5, lng: -0.12 }.is_within_india());
    }
}
