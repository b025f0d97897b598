//! Closed vocabularies for the integer-coded source fields.
//!
//! Each vocabulary maps a finite set of integer codes to a named category.
//! Codes outside the table, non-integral codes and missing codes map to
//! `None`; no category is ever fabricated for an unknown code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Returns the integral code carried by a numeric cell, if any.
fn integral_code(code: Option<f64>) -> Option<i64> {
    let code = code?;
    (code.fract() == 0.0 && code.is_finite()).then_some(code as i64)
}

/// Imaging sequence; the source repeats its artefact block once per sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sequence {
    /// Turbo field echo.
    Tfe,
    /// Balanced steady-state free precession cine.
    Cine,
    /// Viability (late gadolinium enhancement).
    Viab,
}

impl Sequence {
    /// All sequences in source order.
    pub const ALL: [Sequence; 3] = [Sequence::Tfe, Sequence::Cine, Sequence::Viab];

    /// Position in [`Sequence::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label used in canonical column names (e.g. `ratio_TFE`).
    pub fn label(&self) -> &'static str {
        match self {
            Sequence::Tfe => "TFE",
            Sequence::Cine => "CINE",
            Sequence::Viab => "VIAB",
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Left-ventricular wall region built from 17-segment sub-segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Wall {
    Lateral,
    Septal,
    Anterior,
    Inferior,
}

impl Wall {
    /// All walls in canonical column order.
    pub const ALL: [Wall; 4] = [Wall::Lateral, Wall::Septal, Wall::Anterior, Wall::Inferior];

    /// Position in [`Wall::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Wall::Lateral => "lateral",
            Wall::Septal => "septal",
            Wall::Anterior => "anterior",
            Wall::Inferior => "inferior",
        }
    }
}

impl fmt::Display for Wall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implanted device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceCategory {
    /// Implantable cardioverter-defibrillator (code 1).
    Icd,
    /// Permanent pacemaker (code 2).
    Ppm,
    /// Cardiac resynchronization therapy device (code 3).
    Crt,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 3] =
        [DeviceCategory::Icd, DeviceCategory::Ppm, DeviceCategory::Crt];

    /// Maps the source code (ICD = 1, PPM = 2, CRT = 3).
    pub fn from_code(code: Option<f64>) -> Option<Self> {
        match integral_code(code)? {
            1 => Some(DeviceCategory::Icd),
            2 => Some(DeviceCategory::Ppm),
            3 => Some(DeviceCategory::Crt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceCategory::Icd => "ICD",
            DeviceCategory::Ppm => "PPM",
            DeviceCategory::Crt => "CRT",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ICD" => Ok(DeviceCategory::Icd),
            "PPM" => Ok(DeviceCategory::Ppm),
            "CRT" => Ok(DeviceCategory::Crt),
            _ => Err(ModelError::UnknownCategory {
                vocabulary: "device",
                value: s.to_string(),
            }),
        }
    }
}

/// Simplified pre/post-MRI diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosisCategory {
    Infiltrative,
    Valvular,
    /// Hypertrophic cardiomyopathy.
    Hcm,
    Myopericarditis,
    Ischemia,
    /// Other unexplained cardiomyopathy.
    OtherCmp,
    Other,
    /// Ventricular tachycardia.
    Vt,
}

impl DiagnosisCategory {
    /// Maps the source code 1..=8.
    pub fn from_code(code: Option<f64>) -> Option<Self> {
        match integral_code(code)? {
            1 => Some(DiagnosisCategory::Infiltrative),
            2 => Some(DiagnosisCategory::Valvular),
            3 => Some(DiagnosisCategory::Hcm),
            4 => Some(DiagnosisCategory::Myopericarditis),
            5 => Some(DiagnosisCategory::Ischemia),
            6 => Some(DiagnosisCategory::OtherCmp),
            7 => Some(DiagnosisCategory::Other),
            8 => Some(DiagnosisCategory::Vt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisCategory::Infiltrative => "infiltrative",
            DiagnosisCategory::Valvular => "valvular",
            DiagnosisCategory::Hcm => "hcm",
            DiagnosisCategory::Myopericarditis => "myopericarditis",
            DiagnosisCategory::Ischemia => "ischemia",
            DiagnosisCategory::OtherCmp => "other_cmp",
            DiagnosisCategory::Other => "other",
            DiagnosisCategory::Vt => "vt",
        }
    }
}

impl fmt::Display for DiagnosisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Manufacturer {
    Boston,
    /// Medtronic.
    Mdt,
    /// Biotronik.
    Bio,
    StJude,
    Other,
}

impl Manufacturer {
    /// Maps the source code 1..=5.
    pub fn from_code(code: Option<f64>) -> Option<Self> {
        match integral_code(code)? {
            1 => Some(Manufacturer::Boston),
            2 => Some(Manufacturer::Mdt),
            3 => Some(Manufacturer::Bio),
            4 => Some(Manufacturer::StJude),
            5 => Some(Manufacturer::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Manufacturer::Boston => "Boston",
            Manufacturer::Mdt => "MDT",
            Manufacturer::Bio => "Bio",
            Manufacturer::StJude => "StJude",
            Manufacturer::Other => "Other",
        }
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnosis_codes_map_or_null() {
        assert_eq!(
            DiagnosisCategory::from_code(Some(3.0)).map(|d| d.as_str()),
            Some("hcm")
        );
        assert_eq!(DiagnosisCategory::from_code(Some(9.0)), None);
        assert_eq!(DiagnosisCategory::from_code(Some(0.0)), None);
        assert_eq!(DiagnosisCategory::from_code(None), None);
    }

    #[test]
    fn non_integral_codes_are_unmapped() {
        assert_eq!(DeviceCategory::from_code(Some(1.5)), None);
        assert_eq!(DeviceCategory::from_code(Some(3.0)), Some(DeviceCategory::Crt));
    }

    #[test]
    fn device_parses_case_insensitively() {
        assert_eq!("crt".parse::<DeviceCategory>().ok(), Some(DeviceCategory::Crt));
        assert!("LVAD".parse::<DeviceCategory>().is_err());
    }

    #[test]
    fn manufacturer_other_is_named() {
        assert_eq!(Manufacturer::from_code(Some(5.0)), Some(Manufacturer::Other));
        assert_eq!(Manufacturer::from_code(Some(6.0)), None);
    }
}
