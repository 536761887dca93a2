use std::collections::{BTreeMap, HashMap};

use anyhow::bail;
use tracing::debug;

pub const PARKER_NAME: &str = "parker";
pub const HOPP_WOODS_NAME: &str = "hopp-woods";
pub const KYTE_DOOLITTLE_NAME: &str = "kyte-doolittle";
pub const CUSTOM_NAME: &str = "custom";

/// Value used for any residue the scale does not list (X, B, Z, U, ...).
pub const UNKNOWN_RESIDUE_VALUE: f64 = 0.0;

/// Parker-style hydrophilicity values used for HIV env B-cell mapping.
pub const PARKER: [(u8, f64); 20] = [
    (b'A', 0.0), (b'C', 1.4), (b'D', 3.0), (b'E', 3.0), (b'F', -2.5),
    (b'G', 0.0), (b'H', -0.5), (b'I', -1.8), (b'K', 3.0), (b'L', -1.8),
    (b'M', -1.3), (b'N', 0.2), (b'P', 0.0), (b'Q', 0.2), (b'R', 3.0),
    (b'S', 0.3), (b'T', 0.4), (b'V', -1.5), (b'W', -3.4), (b'Y', -2.3),
];

/// Hopp & Woods (1981).
pub const HOPP_WOODS: [(u8, f64); 20] = [
    (b'A', -0.5), (b'C', -1.0), (b'D', 3.0), (b'E', 3.0), (b'F', -2.5),
    (b'G', 0.0), (b'H', -0.5), (b'I', -1.8), (b'K', 3.0), (b'L', -1.8),
    (b'M', -1.3), (b'N', 0.2), (b'P', 0.0), (b'Q', 0.2), (b'R', 3.0),
    (b'S', 0.3), (b'T', -0.4), (b'V', -1.5), (b'W', -3.4), (b'Y', -2.3),
];

/// Kyte & Doolittle (1982). Positive means hydrophobic.
pub const KYTE_DOOLITTLE: [(u8, f64); 20] = [
    (b'A', 1.8), (b'C', 2.5), (b'D', -3.5), (b'E', -3.5), (b'F', 2.8),
    (b'G', -0.4), (b'H', -3.2), (b'I', 4.5), (b'K', -3.9), (b'L', 3.8),
    (b'M', 1.9), (b'N', -3.5), (b'P', -1.6), (b'Q', -3.5), (b'R', -4.5),
    (b'S', -0.8), (b'T', -0.7), (b'V', 4.2), (b'W', -0.9), (b'Y', -1.3),
];

/// Residue -> scalar lookup with a 0.0 fallback for anything unlisted.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrophilicityScale {
    name: String,
    values: HashMap<u8, f64>,
}

impl HydrophilicityScale {
    pub fn from_pairs(name: &str, pairs: &[(u8, f64)]) -> Self {
        HydrophilicityScale {
            name: name.to_string(),
            values: pairs
                .iter()
                .map(|&(residue, value)| (residue.to_ascii_uppercase(), value))
                .collect(),
        }
    }

    /// Build a scale from a user table keyed by one-letter residue codes.
    pub fn from_table(name: &str, table: &BTreeMap<String, f64>) -> anyhow::Result<Self> {
        let mut pairs = Vec::with_capacity(table.len());
        for (key, &value) in table {
            let bytes = key.trim().as_bytes();
            if bytes.len() != 1 || !bytes[0].is_ascii_alphabetic() {
                bail!("scale key '{}' is not a one-letter residue code", key);
            }
            if !value.is_finite() {
                bail!("scale value for '{}' is not finite", key);
            }
            pairs.push((bytes[0], value));
        }
        if pairs.is_empty() {
            bail!("scale '{}' has no entries", name);
        }
        debug!("Built scale '{}' with {} residues", name, pairs.len());
        Ok(Self::from_pairs(name, &pairs))
    }

    pub fn parker() -> Self {
        Self::from_pairs(PARKER_NAME, &PARKER)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Case-insensitive; unknown residues give [`UNKNOWN_RESIDUE_VALUE`].
    pub fn value(&self, residue: u8) -> f64 {
        self.values
            .get(&residue.to_ascii_uppercase())
            .copied()
            .unwrap_or(UNKNOWN_RESIDUE_VALUE)
    }

    /// Smallest and largest value a window mean can take, default included.
    pub fn bounds(&self) -> (f64, f64) {
        self.values.values().fold(
            (UNKNOWN_RESIDUE_VALUE, UNKNOWN_RESIDUE_VALUE),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
    }
}

pub fn scale_by_name(name: &str) -> anyhow::Result<HydrophilicityScale> {
    let scale = match name.to_ascii_lowercase().as_str() {
        PARKER_NAME => HydrophilicityScale::from_pairs(PARKER_NAME, &PARKER),
        HOPP_WOODS_NAME => HydrophilicityScale::from_pairs(HOPP_WOODS_NAME, &HOPP_WOODS),
        KYTE_DOOLITTLE_NAME => HydrophilicityScale::from_pairs(KYTE_DOOLITTLE_NAME, &KYTE_DOOLITTLE),
        other => bail!(
            "unknown hydrophilicity scale '{}' (expected {}, {}, {} or {})",
            other,
            PARKER_NAME,
            HOPP_WOODS_NAME,
            KYTE_DOOLITTLE_NAME,
            CUSTOM_NAME
        ),
    };
    Ok(scale)
}
