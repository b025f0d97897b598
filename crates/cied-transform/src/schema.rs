//! Raw-name to canonical-field mapping table.
//!
//! Source column names embed their coding legend and are not consistent
//! between the three sequence groups (the RV cause column, for one, has a
//! space before `IPG=4` in two groups and none in the other). Every raw
//! name the feature builder reads is listed here; a source rename is a
//! one-line edit in this file.

use cied_model::{Sequence, Wall};

/// How a raw field is coerced into its canonical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Parsed as a number; unparseable values become null.
    Numeric,
    /// Yes/no tokens or 0/1; anything else becomes 0.
    Binary,
    /// `M`/`male` and `F`/`female` first, then the binary rule.
    Sex,
    /// 1 when the cell holds any value.
    Presence,
}

/// A raw source field read by the feature builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Age,
    Sex,
    HeightCm,
    WeightKg,
    Bmi,
    Hf,
    Htn,
    Cad,
    Mi,
    VtVf,
    Vfib,
    Vt,
    Afib,
    Ckd,
    PreDiagnosis,
    PostDiagnosis,
    DeviceType,
    IcdIndication,
    PpmIndication,
    MrConditional,
    BodyPosition,
    CoarsePosition,
    Manufacturer,
    AtrialLead,
    VentricularLead,
    LvLead,
    SubqLead,
    Rotation,
    DistCardiacSilhouette,
    DistLvApex,
    WidestChest,
    NonDiagnostic,
    AdditionalInfo,
    Confirmed,
    ManagementChanged,
    /// Worst artefact grade of a sequence.
    ArtefactGrade(Sequence),
    ArtefactRatio(Sequence),
    /// Primary cause code (1=IPG, 2=Lead, 3=Both, 0=None).
    Cause(Sequence),
    /// RV cause code (1=lead alone, 2=lead and device, 3=neither, 4=IPG).
    RvCause(Sequence),
    /// Free-text name of the acquired sequence.
    SequenceName(Sequence),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: Field,
    pub raw: String,
    pub coercion: Coercion,
}

impl FieldMapping {
    fn new(field: Field, raw: impl Into<String>, coercion: Coercion) -> Self {
        Self {
            field,
            raw: raw.into(),
            coercion,
        }
    }
}

const PRE_DIAGNOSIS: &str = "Pre-MR diagnosis/suspected_simplified (1=infiltrative,2=valvulopathy,3=HOCM,4=myopericarditis,5=ischemia,6=other unexplained CMP,7=Othe, 8= VT)";
const POST_DIAGNOSIS: &str = "Post-MR diagnosis/suspected_simplified (1=infiltrative,2=valvulopathy,3=HOCM,4=myopericarditis,5=ischemia,6=other unexplained CMP,7=Othe, 8= VT)";
const ADDITIONAL_INFO: &str = "Did MRI provide additional information to the existing diagnosis? (ie quantity of iron, location of scar, etc) ";

/// Suffix the source tooling appends to the repeated sequence groups.
pub fn sequence_suffix(sequence: Sequence) -> &'static str {
    match sequence {
        Sequence::Tfe => "",
        Sequence::Cine => ".1",
        Sequence::Viab => ".2",
    }
}

fn rv_cause_column(sequence: Sequence) -> &'static str {
    match sequence {
        Sequence::Tfe => {
            "RV Artefact cause (Lead alone=1, lead and device=2, neither=3,IPG=4)"
        }
        Sequence::Cine => {
            "RV Artefact cause (Lead alone=1, lead and device=2, neither=3, IPG=4)"
        }
        Sequence::Viab => {
            "RV Artefact cause (Lead alone=1, lead and device=2, neither=3, IPG=4).1"
        }
    }
}

fn sequence_name_column(sequence: Sequence) -> &'static str {
    match sequence {
        Sequence::Tfe => "TFE (exact sequence listed)",
        Sequence::Cine => "CINE_SSFP (exact sequence listed)",
        Sequence::Viab => "VIAB (exact sequence listed)",
    }
}

/// Every scalar field the builder reads, with its raw name and coercion.
pub fn field_mappings() -> Vec<FieldMapping> {
    use Coercion::{Binary, Numeric, Presence, Sex};

    let mut mappings = vec![
        FieldMapping::new(Field::Age, "Age", Numeric),
        FieldMapping::new(Field::Sex, "Sex (1-M)", Sex),
        FieldMapping::new(Field::HeightCm, "Height cm", Numeric),
        FieldMapping::new(Field::WeightKg, "Weight Kg", Numeric),
        FieldMapping::new(Field::Bmi, "BMI", Numeric),
        FieldMapping::new(Field::Hf, "HF (1=Y)", Binary),
        FieldMapping::new(Field::Htn, "HTN (1=Y)", Binary),
        FieldMapping::new(Field::Cad, "CAD", Binary),
        FieldMapping::new(Field::Mi, "MI (Y=1)", Binary),
        FieldMapping::new(Field::VtVf, "VT/VF", Binary),
        FieldMapping::new(Field::Vfib, "Vfib (1=Y)", Binary),
        FieldMapping::new(Field::Vt, "VT (1=Y)", Binary),
        FieldMapping::new(Field::Afib, "Afib (1=Y)", Binary),
        FieldMapping::new(Field::Ckd, "CKD (1=Y)", Binary),
        FieldMapping::new(Field::PreDiagnosis, PRE_DIAGNOSIS, Numeric),
        FieldMapping::new(Field::PostDiagnosis, POST_DIAGNOSIS, Numeric),
        FieldMapping::new(
            Field::DeviceType,
            "Type of Device (ICD =1 PPM = 2 CRT = 3)",
            Numeric,
        ),
        FieldMapping::new(
            Field::IcdIndication,
            "ICD indication (Primary prevention = 1, secodary prevention =2)",
            Numeric,
        ),
        FieldMapping::new(
            Field::PpmIndication,
            "PPM indications (CHB = 1, SND = 2, Other = 3)",
            Numeric,
        ),
        FieldMapping::new(Field::MrConditional, "MR Conditional ", Binary),
        FieldMapping::new(
            Field::BodyPosition,
            "Position in body (left chest = 1, right chest = 2, leadless = 3, 4=subC)",
            Numeric,
        ),
        FieldMapping::new(Field::CoarsePosition, "Position (L chest=1, other=2)", Numeric),
        FieldMapping::new(
            Field::Manufacturer,
            "Manufacturer (1=Boston,2=MDT,3=Bio,4=StJude,5=other)",
            Numeric,
        ),
        FieldMapping::new(Field::AtrialLead, "Atrial Lead Yes/No", Binary),
        FieldMapping::new(Field::VentricularLead, "Ventricular lead Yes/No", Binary),
        FieldMapping::new(Field::LvLead, "LV lead Yes/No", Binary),
        FieldMapping::new(
            Field::SubqLead,
            "SubQ lead - (0=no,1=yes,3=other (leadless)",
            Numeric,
        ),
        FieldMapping::new(Field::Rotation, "Rotation. 0 = normal, 1 rotated.", Binary),
        FieldMapping::new(
            Field::DistCardiacSilhouette,
            "CXR- PPM to cardiac silhouette - shortest (mm)",
            Numeric,
        ),
        FieldMapping::new(Field::DistLvApex, "PPM to LV Apex", Numeric),
        FieldMapping::new(Field::WidestChest, "Widest Chest Transverse Diameter", Numeric),
        FieldMapping::new(Field::NonDiagnostic, "Non-diagnostic", Binary),
        FieldMapping::new(Field::AdditionalInfo, ADDITIONAL_INFO, Binary),
        FieldMapping::new(
            Field::Confirmed,
            " Was the pre-MRI (tentative) diagnosis confirmed?",
            Binary,
        ),
        FieldMapping::new(
            Field::ManagementChanged,
            "Was patient management altered as a result of the scan data?",
            Binary,
        ),
    ];

    for sequence in Sequence::ALL {
        let sfx = sequence_suffix(sequence);
        mappings.push(FieldMapping::new(
            Field::ArtefactGrade(sequence),
            format!("Any artefact (grade 3 or above){sfx}"),
            Numeric,
        ));
        mappings.push(FieldMapping::new(
            Field::ArtefactRatio(sequence),
            format!("Artefact ratio (biventricular){sfx}"),
            Numeric,
        ));
        mappings.push(FieldMapping::new(
            Field::Cause(sequence),
            format!("Cause of Artifact (1=IPG, 2=Lead, 3=Both, 0=None){sfx}"),
            Numeric,
        ));
        mappings.push(FieldMapping::new(
            Field::RvCause(sequence),
            rv_cause_column(sequence),
            Numeric,
        ));
        mappings.push(FieldMapping::new(
            Field::SequenceName(sequence),
            sequence_name_column(sequence),
            Presence,
        ));
    }
    mappings
}

/// Sub-segment columns (17-segment model) that make up a wall in one
/// sequence group.
pub fn wall_segments(wall: Wall, sequence: Sequence) -> Vec<String> {
    let segments: &[&str] = match wall {
        Wall::Lateral => &[
            "B_Anterolateral",
            "B_Inferolateral",
            "M_Anterolateral",
            "M_Inferolateral",
            "A_Lateral",
        ],
        Wall::Septal => &[
            "B_Inferoseptal",
            "B_Anteroseptal",
            "M_Inferoseptal",
            "M_Anteroseptal",
            "A_Septal",
        ],
        Wall::Anterior => &["B_Anterior", "M_Anterior", "A_Anterior"],
        Wall::Inferior => &["B_Inferior", "M_Inferior", "A_Inferior"],
    };
    let sfx = sequence_suffix(sequence);
    segments
        .iter()
        .map(|segment| format!("{segment}{sfx}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_field_is_mapped_once() {
        let mappings = field_mappings();
        let fields: HashSet<Field> = mappings.iter().map(|m| m.field).collect();
        assert_eq!(fields.len(), mappings.len());
        let raws: HashSet<&str> = mappings.iter().map(|m| m.raw.as_str()).collect();
        assert_eq!(raws.len(), mappings.len());
    }

    #[test]
    fn sequence_groups_use_suffixes() {
        let mappings = field_mappings();
        let raw_for = |field: Field| {
            mappings
                .iter()
                .find(|m| m.field == field)
                .map(|m| m.raw.clone())
        };
        assert_eq!(
            raw_for(Field::ArtefactRatio(Sequence::Viab)).as_deref(),
            Some("Artefact ratio (biventricular).2")
        );
        assert_eq!(
            raw_for(Field::RvCause(Sequence::Cine)).as_deref(),
            Some("RV Artefact cause (Lead alone=1, lead and device=2, neither=3, IPG=4)")
        );
    }

    #[test]
    fn wall_segment_counts() {
        assert_eq!(wall_segments(Wall::Lateral, Sequence::Tfe).len(), 5);
        assert_eq!(wall_segments(Wall::Anterior, Sequence::Cine)[0], "B_Anterior.1");
    }
}
