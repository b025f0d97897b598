//! Feature builder: one raw row in, one canonical record out.
//!
//! Raw columns are resolved and coerced once per table through the
//! mapping table in [`crate::schema`]; records are then assembled row by
//! row. No field-level problem is ever an error: absent columns read as
//! all-missing and unparseable cells are repaired to null or 0.

use std::collections::HashMap;

use cied_common::{numeric_value, safe_ratio, try_binary_value};
use cied_ingest::RawTable;
use cied_model::{
    CanonicalRecord, CauseAttribution, Comorbidities, Composites, Demographics, DeviceCategory,
    DeviceConfig, Diagnosis, DiagnosisCategory, Geometry, LeadPresence, Manufacturer, Outcomes,
    Sequence, SequenceArtefact, Wall,
};
use polars::prelude::{AnyValue, Series};
use tracing::debug;

use crate::composites::{
    attribute_cause, clean_across, max_present, mean_present, severe_artefact, visibility_score,
    wall_severity,
};
use crate::schema::{Coercion, Field, FieldMapping, field_mappings, wall_segments};

/// Coerced values of one raw field, one entry per row.
#[derive(Debug, Clone)]
enum Extracted {
    Numbers(Vec<Option<f64>>),
    Flags(Vec<i32>),
}

fn sex_value(cell: AnyValue<'_>) -> Option<i32> {
    let text = match &cell {
        AnyValue::String(s) => Some(s.trim().to_lowercase()),
        AnyValue::StringOwned(s) => Some(s.trim().to_lowercase()),
        _ => None,
    };
    match text.as_deref() {
        Some("m" | "male") => Some(1),
        Some("f" | "female") => Some(0),
        _ => try_binary_value(cell),
    }
}

fn extract(mapping: &FieldMapping, series: &Series) -> Extracted {
    let cells = (0..series.len()).map(|idx| series.get(idx).unwrap_or(AnyValue::Null));
    let mut repaired = 0usize;
    let extracted = match mapping.coercion {
        Coercion::Numeric => Extracted::Numbers(
            cells
                .map(|cell| {
                    let present = !cell.is_null();
                    let value = numeric_value(cell);
                    repaired += usize::from(present && value.is_none());
                    value
                })
                .collect(),
        ),
        Coercion::Binary | Coercion::Sex => Extracted::Flags(
            cells
                .map(|cell| {
                    let present = !cell.is_null();
                    let value = if mapping.coercion == Coercion::Sex {
                        sex_value(cell)
                    } else {
                        try_binary_value(cell)
                    };
                    repaired += usize::from(present && value.is_none());
                    value.unwrap_or(0)
                })
                .collect(),
        ),
        Coercion::Presence => Extracted::Flags(
            cells.map(|cell| i32::from(!cell.is_null())).collect(),
        ),
    };
    if repaired > 0 {
        debug!(
            field = ?mapping.field,
            column = %mapping.raw,
            repaired,
            "coerced unparseable values"
        );
    }
    extracted
}

/// Raw fields of a table, resolved and coerced.
#[derive(Debug, Clone)]
pub struct SourceColumns {
    height: usize,
    fields: HashMap<Field, Extracted>,
    walls: HashMap<(Wall, Sequence), Vec<Vec<Option<f64>>>>,
}

impl SourceColumns {
    pub fn resolve(table: &RawTable) -> Self {
        let height = table.height();
        let mut fields = HashMap::new();
        let mut absent = Vec::new();

        for mapping in field_mappings() {
            let extracted = match table.series(&mapping.raw) {
                Some(series) => extract(&mapping, series),
                None => {
                    absent.push(mapping.raw.clone());
                    match mapping.coercion {
                        Coercion::Numeric => Extracted::Numbers(vec![None; height]),
                        _ => Extracted::Flags(vec![0; height]),
                    }
                }
            };
            fields.insert(mapping.field, extracted);
        }

        let mut walls = HashMap::new();
        for sequence in Sequence::ALL {
            for wall in Wall::ALL {
                let segments: Vec<Vec<Option<f64>>> = wall_segments(wall, sequence)
                    .iter()
                    .filter_map(|name| table.series(name))
                    .map(|series| {
                        (0..series.len())
                            .map(|idx| numeric_value(series.get(idx).unwrap_or(AnyValue::Null)))
                            .collect()
                    })
                    .collect();
                if segments.is_empty() {
                    debug!(%wall, %sequence, "no sub-segment columns; wall reads as not severe");
                }
                walls.insert((wall, sequence), segments);
            }
        }

        if !absent.is_empty() {
            debug!(count = absent.len(), columns = ?absent, "source columns absent");
        }

        Self {
            height,
            fields,
            walls,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn number(&self, field: Field, row: usize) -> Option<f64> {
        match self.fields.get(&field) {
            Some(Extracted::Numbers(values)) => values.get(row).copied().flatten(),
            Some(Extracted::Flags(values)) => values.get(row).map(|v| f64::from(*v)),
            None => None,
        }
    }

    fn flag(&self, field: Field, row: usize) -> i32 {
        match self.fields.get(&field) {
            Some(Extracted::Flags(values)) => values.get(row).copied().unwrap_or(0),
            Some(Extracted::Numbers(values)) => {
                i32::from(values.get(row).copied().flatten() == Some(1.0))
            }
            None => 0,
        }
    }

    fn wall_grades(&self, wall: Wall, sequence: Sequence, row: usize) -> Vec<Option<f64>> {
        self.walls
            .get(&(wall, sequence))
            .map(|segments| {
                segments
                    .iter()
                    .map(|values| values.get(row).copied().flatten())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_code(&self, field: Field, row: usize, code: f64) -> i32 {
        i32::from(self.number(field, row) == Some(code))
    }

    /// Builds the canonical record of one row.
    pub fn record(&self, row: usize) -> CanonicalRecord {
        let demographics = Demographics {
            age: self.number(Field::Age, row),
            sex_male: self.flag(Field::Sex, row),
            height_cm: self.number(Field::HeightCm, row),
            weight_kg: self.number(Field::WeightKg, row),
            bmi: self.number(Field::Bmi, row),
        };

        let comorbidities = Comorbidities {
            hf: self.flag(Field::Hf, row),
            htn: self.flag(Field::Htn, row),
            cad: self.flag(Field::Cad, row),
            mi: self.flag(Field::Mi, row),
            vt_vf: self.flag(Field::VtVf, row),
            vfib: self.flag(Field::Vfib, row),
            vt: self.flag(Field::Vt, row),
            afib: self.flag(Field::Afib, row),
            ckd: self.flag(Field::Ckd, row),
        };

        let pre_code = self.number(Field::PreDiagnosis, row);
        let post_code = self.number(Field::PostDiagnosis, row);
        let diagnosis = Diagnosis {
            pre_code,
            post_code,
            pre: DiagnosisCategory::from_code(pre_code),
            post: DiagnosisCategory::from_code(post_code),
        };

        let type_code = self.number(Field::DeviceType, row);
        let manufacturer_code = self.number(Field::Manufacturer, row);
        let device = DeviceConfig {
            type_code,
            category: DeviceCategory::from_code(type_code),
            icd_indication_code: self.number(Field::IcdIndication, row),
            ppm_indication_code: self.number(Field::PpmIndication, row),
            mr_conditional: self.flag(Field::MrConditional, row),
            position_body_code: self.number(Field::BodyPosition, row),
            left_chest: self.is_code(Field::BodyPosition, row, 1.0),
            right_chest: self.is_code(Field::BodyPosition, row, 2.0),
            leadless: self.is_code(Field::BodyPosition, row, 3.0),
            subq: self.is_code(Field::BodyPosition, row, 4.0),
            left_vs_other: self.is_code(Field::BodyPosition, row, 1.0),
            left_vs_other_coarse: self.is_code(Field::CoarsePosition, row, 1.0),
            manufacturer_code,
            manufacturer: Manufacturer::from_code(manufacturer_code),
            leads: LeadPresence {
                atrial: self.flag(Field::AtrialLead, row),
                ventricular: self.flag(Field::VentricularLead, row),
                lv: self.flag(Field::LvLead, row),
                // Code 3 is "other (leadless)", not a subcutaneous lead.
                subq: self.is_code(Field::SubqLead, row, 1.0),
            },
        };

        let dist_card_sil_mm = self.number(Field::DistCardiacSilhouette, row);
        let dist_lv_apex_mm = self.number(Field::DistLvApex, row);
        let widest_chest_mm = self.number(Field::WidestChest, row);
        let geometry = Geometry {
            rotation: self.flag(Field::Rotation, row),
            dist_card_sil_mm,
            dist_lv_apex_mm,
            widest_chest_mm,
            norm_dist_card_sil: safe_ratio(dist_card_sil_mm, widest_chest_mm),
            norm_dist_lv_apex: safe_ratio(dist_lv_apex_mm, widest_chest_mm),
        };

        let sequences = Sequence::ALL.map(|sequence| self.sequence_artefact(sequence, row));
        let composites = composites(&sequences);

        let outcomes = Outcomes {
            non_diagnostic: self.flag(Field::NonDiagnostic, row),
            add_info: self.flag(Field::AdditionalInfo, row),
            confirmed: self.flag(Field::Confirmed, row),
            mgmt_change: self.flag(Field::ManagementChanged, row),
            dx_change: diagnosis.changed(),
        };

        CanonicalRecord {
            demographics,
            comorbidities,
            diagnosis,
            device,
            geometry,
            sequences,
            composites,
            outcomes,
        }
    }

    fn sequence_artefact(&self, sequence: Sequence, row: usize) -> SequenceArtefact {
        let wall_severe = Wall::ALL.map(|wall| wall_severity(&self.wall_grades(wall, sequence, row)));
        SequenceArtefact {
            severe: severe_artefact(self.number(Field::ArtefactGrade(sequence), row)),
            ratio: self.number(Field::ArtefactRatio(sequence), row),
            wall_severe,
            cause: attribute_cause(
                self.number(Field::Cause(sequence), row),
                self.number(Field::RvCause(sequence), row),
            ),
            available: self.flag(Field::SequenceName(sequence), row),
        }
    }
}

/// Cross-sequence composites of one record.
pub fn composites(sequences: &[SequenceArtefact]) -> Composites {
    let ratios: Vec<Option<f64>> = sequences.iter().map(|s| s.ratio).collect();
    let wall_clean = Wall::ALL.map(|wall| {
        let severities: Vec<i32> = sequences
            .iter()
            .map(|s| s.wall_severe[wall.index()])
            .collect();
        clean_across(&severities)
    });
    let cause = sequences
        .iter()
        .map(|s| s.cause)
        .fold(CauseAttribution::default(), CauseAttribution::merge);

    Composites {
        artifact_burden: mean_present(&ratios),
        max_ratio: max_present(&ratios),
        wall_clean,
        lv_visibility_score: visibility_score(&wall_clean),
        cause,
    }
}

/// Builds one canonical record per raw row, in row order.
pub fn build_records(table: &RawTable) -> Vec<CanonicalRecord> {
    let columns = SourceColumns::resolve(table);
    (0..columns.height()).map(|row| columns.record(row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_text_codes() {
        assert_eq!(sex_value(AnyValue::String("M")), Some(1));
        assert_eq!(sex_value(AnyValue::String(" female ")), Some(0));
        assert_eq!(sex_value(AnyValue::String("yes")), Some(1));
        assert_eq!(sex_value(AnyValue::Float64(0.0)), Some(0));
        assert_eq!(sex_value(AnyValue::String("unknown")), None);
    }

    #[test]
    fn composites_of_missing_sequences() {
        let sequences = [
            SequenceArtefact::default(),
            SequenceArtefact::default(),
            SequenceArtefact::default(),
        ];
        let out = composites(&sequences);
        assert_eq!(out.artifact_burden, None);
        assert_eq!(out.wall_clean, [Some(1); 4]);
        assert_eq!(out.lv_visibility_score, Some(4));
    }

    #[test]
    fn composites_or_causes_across_sequences() {
        let mut sequences = [
            SequenceArtefact::default(),
            SequenceArtefact::default(),
            SequenceArtefact::default(),
        ];
        sequences[1].cause.lead = 1;
        sequences[2].cause.ipg = 1;
        sequences[2].wall_severe[Wall::Septal.index()] = 1;
        let out = composites(&sequences);
        assert_eq!(out.cause, CauseAttribution { ipg: 1, lead: 1, both: 0 });
        assert_eq!(out.wall_clean[Wall::Septal.index()], Some(0));
        assert_eq!(out.lv_visibility_score, Some(3));
    }
}
