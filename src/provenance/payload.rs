// SPDX-License-Identifier: GPL-3.0-only

//! Classification of decoded QR payloads
//!
//! AyurTrace labels carry one of a few payload shapes: a bare product code,
//! a consumer provenance link, a JSON batch record, or a generated batch
//! reference. Anything else is kept as plain text.

use serde::Deserialize;

/// Path segment that precedes the batch id in provenance links
const PROVENANCE_PATH: &str = "/provenance/consumer/";

/// `type` field of JSON batch records
const BATCH_RECORD_TYPE: &str = "AyurTrace_Batch";

/// Parsed QR payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TracePayload {
    /// Product code such as `AYR-ASH-2024-001`
    ProductCode(String),
    /// Consumer provenance URL with the batch id extracted
    ProvenanceLink { url: String, batch_id: String },
    /// JSON batch record printed on packaging
    BatchRecord {
        batch_id: String,
        product_name: Option<String>,
        manufacturer: Option<String>,
    },
    /// Generated reference, e.g. `QR20241201ABC123` or `BAT20241201X9K2`
    BatchReference(String),
    /// Anything else
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchRecordJson {
    #[serde(rename = "type")]
    kind: String,
    batch_id: String,
    product_name: Option<String>,
    manufacturer: Option<String>,
}

impl TracePayload {
    /// Parse decoded QR content
    pub fn parse(content: &str) -> Self {
        let trimmed = content.trim();

        if let Some(batch_id) = provenance_batch_id(trimmed) {
            return Self::ProvenanceLink {
                url: trimmed.to_string(),
                batch_id,
            };
        }

        if trimmed.starts_with('{') {
            if let Ok(record) = serde_json::from_str::<BatchRecordJson>(trimmed) {
                if record.kind == BATCH_RECORD_TYPE {
                    return Self::BatchRecord {
                        batch_id: record.batch_id,
                        product_name: record.product_name,
                        manufacturer: record.manufacturer,
                    };
                }
            }
        }

        if is_product_code(trimmed) {
            return Self::ProductCode(trimmed.to_string());
        }

        if is_batch_reference(trimmed) {
            return Self::BatchReference(trimmed.to_string());
        }

        Self::Text(trimmed.to_string())
    }

    /// Product or batch identifier carried by the payload
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::ProductCode(code) | Self::BatchReference(code) => Some(code),
            Self::ProvenanceLink { batch_id, .. } | Self::BatchRecord { batch_id, .. } => {
                Some(batch_id)
            }
            Self::Text(_) => None,
        }
    }

    /// Whether the payload looks like an AyurTrace label at all
    pub fn is_ayurtrace(&self) -> bool {
        !matches!(self, Self::Text(_))
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::ProductCode(_) => "Product code",
            Self::ProvenanceLink { .. } => "Provenance link",
            Self::BatchRecord { .. } => "Batch record",
            Self::BatchReference(_) => "Batch reference",
            Self::Text(_) => "Text",
        }
    }
}

/// Batch id from a provenance link, without query parameters
fn provenance_batch_id(content: &str) -> Option<String> {
    let (_, rest) = content.split_once(PROVENANCE_PATH)?;
    let batch_id = rest.split(['?', '&', '#']).next().unwrap_or_default();
    if batch_id.is_empty() {
        None
    } else {
        Some(batch_id.to_string())
    }
}

/// `AYR-<HERB>-<YEAR>-<SEQ>`: letters, four digits, digits
fn is_product_code(content: &str) -> bool {
    let parts: Vec<&str> = content.split('-').collect();
    let [prefix, herb, year, seq] = parts.as_slice() else {
        return false;
    };

    prefix.eq_ignore_ascii_case("AYR")
        && !herb.is_empty()
        && herb.chars().all(|c| c.is_ascii_alphabetic())
        && year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && !seq.is_empty()
        && seq.chars().all(|c| c.is_ascii_digit())
}

/// `QR` or `BAT`, an eight digit date, then an uppercase alphanumeric tail
fn is_batch_reference(content: &str) -> bool {
    let Some(rest) = content
        .strip_prefix("BAT")
        .or_else(|| content.strip_prefix("QR"))
    else {
        return false;
    };

    let (date, tail) = match (rest.get(..8), rest.get(8..)) {
        (Some(date), Some(tail)) => (date, tail),
        _ => return false,
    };

    date.chars().all(|c| c.is_ascii_digit())
        && !tail.is_empty()
        && tail
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
