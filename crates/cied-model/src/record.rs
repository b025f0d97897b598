//! The canonical per-patient record.
//!
//! A [`CanonicalRecord`] is derived 1:1 from one raw spreadsheet row and is
//! never mutated afterwards. [`CanonicalRecord::cells`] flattens it into
//! the column order of [`crate::columns::canonical_columns`].

use serde::{Deserialize, Serialize};

use crate::columns::ColumnKind;
use crate::enums::{DeviceCategory, DiagnosisCategory, Manufacturer, Sequence, Wall};

/// One flattened field value, tagged with its storage kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Flag(i32),
    Count(Option<i32>),
    Float(Option<f64>),
    Code(Option<f64>),
    Category(Option<&'static str>),
}

impl Cell {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Cell::Flag(_) => ColumnKind::Flag,
            Cell::Count(_) => ColumnKind::Count,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Code(_) => ColumnKind::Code,
            Cell::Category(_) => ColumnKind::Category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: Option<f64>,
    pub sex_male: i32,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comorbidities {
    pub hf: i32,
    pub htn: i32,
    pub cad: i32,
    pub mi: i32,
    pub vt_vf: i32,
    pub vfib: i32,
    pub vt: i32,
    pub afib: i32,
    pub ckd: i32,
}

/// Pre- and post-MRI diagnosis, kept both as raw code and named category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub pre_code: Option<f64>,
    pub post_code: Option<f64>,
    pub pre: Option<DiagnosisCategory>,
    pub post: Option<DiagnosisCategory>,
}

impl Diagnosis {
    /// 1 when both codes are present and differ; a missing code never
    /// counts as a change.
    pub fn changed(&self) -> i32 {
        match (self.pre_code, self.post_code) {
            (Some(pre), Some(post)) if pre != post => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadPresence {
    pub atrial: i32,
    pub ventricular: i32,
    pub lv: i32,
    pub subq: i32,
}

impl LeadPresence {
    pub fn count(&self) -> i32 {
        self.atrial + self.ventricular + self.lv + self.subq
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub type_code: Option<f64>,
    pub category: Option<DeviceCategory>,
    pub icd_indication_code: Option<f64>,
    pub ppm_indication_code: Option<f64>,
    pub mr_conditional: i32,
    pub position_body_code: Option<f64>,
    pub left_chest: i32,
    pub right_chest: i32,
    pub leadless: i32,
    pub subq: i32,
    pub left_vs_other: i32,
    pub left_vs_other_coarse: i32,
    pub manufacturer_code: Option<f64>,
    pub manufacturer: Option<Manufacturer>,
    pub leads: LeadPresence,
}

impl DeviceConfig {
    pub fn is_crt(&self) -> i32 {
        i32::from(self.category == Some(DeviceCategory::Crt))
    }

    pub fn indication_missing(&self) -> i32 {
        i32::from(self.icd_indication_code.is_none() && self.ppm_indication_code.is_none())
    }

    pub fn manufacturer_other(&self) -> i32 {
        i32::from(self.manufacturer == Some(Manufacturer::Other))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub rotation: i32,
    pub dist_card_sil_mm: Option<f64>,
    pub dist_lv_apex_mm: Option<f64>,
    pub widest_chest_mm: Option<f64>,
    pub norm_dist_card_sil: Option<f64>,
    pub norm_dist_lv_apex: Option<f64>,
}

/// Which component an artefact was attributed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseAttribution {
    pub ipg: i32,
    pub lead: i32,
    pub both: i32,
}

impl CauseAttribution {
    /// Flag-wise OR.
    pub fn merge(self, other: CauseAttribution) -> CauseAttribution {
        CauseAttribution {
            ipg: self.ipg | other.ipg,
            lead: self.lead | other.lead,
            both: self.both | other.both,
        }
    }
}

/// Artefact metrics of a single imaging sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceArtefact {
    pub severe: i32,
    pub ratio: Option<f64>,
    /// Indexed by [`Wall::index`].
    pub wall_severe: [i32; 4],
    pub cause: CauseAttribution,
    pub available: i32,
}

impl SequenceArtefact {
    pub fn wall_clean(&self, wall: Wall) -> i32 {
        1 - self.wall_severe[wall.index()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composites {
    pub artifact_burden: Option<f64>,
    pub max_ratio: Option<f64>,
    /// Indexed by [`Wall::index`].
    pub wall_clean: [Option<i32>; 4],
    pub lv_visibility_score: Option<i32>,
    pub cause: CauseAttribution,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcomes {
    pub non_diagnostic: i32,
    pub add_info: i32,
    pub confirmed: i32,
    pub mgmt_change: i32,
    pub dx_change: i32,
}

impl Outcomes {
    /// `dx_change + MgmtChange + AddInfo - NonDiagnostic`
    pub fn utility_score(&self) -> i32 {
        self.dx_change + self.mgmt_change + self.add_info - self.non_diagnostic
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub demographics: Demographics,
    pub comorbidities: Comorbidities,
    pub diagnosis: Diagnosis,
    pub device: DeviceConfig,
    pub geometry: Geometry,
    /// Indexed by [`Sequence::index`].
    pub sequences: [SequenceArtefact; 3],
    pub composites: Composites,
    pub outcomes: Outcomes,
}

impl CanonicalRecord {
    pub fn sequence(&self, sequence: Sequence) -> &SequenceArtefact {
        &self.sequences[sequence.index()]
    }

    /// Flattens the record in canonical column order.
    pub fn cells(&self) -> Vec<Cell> {
        let demo = &self.demographics;
        let co = &self.comorbidities;
        let dx = &self.diagnosis;
        let dev = &self.device;
        let geo = &self.geometry;
        let comp = &self.composites;
        let out = &self.outcomes;

        let mut cells = vec![
            Cell::Float(demo.age),
            Cell::Flag(demo.sex_male),
            Cell::Float(demo.height_cm),
            Cell::Float(demo.weight_kg),
            Cell::Float(demo.bmi),
            Cell::Flag(co.hf),
            Cell::Flag(co.htn),
            Cell::Flag(co.cad),
            Cell::Flag(co.mi),
            Cell::Flag(co.vt_vf),
            Cell::Flag(co.vfib),
            Cell::Flag(co.vt),
            Cell::Flag(co.afib),
            Cell::Flag(co.ckd),
            Cell::Code(dx.pre_code),
            Cell::Code(dx.post_code),
            Cell::Category(dx.pre.map(|d| d.as_str())),
            Cell::Category(dx.post.map(|d| d.as_str())),
            Cell::Code(dev.type_code),
            Cell::Category(dev.category.map(|d| d.as_str())),
            Cell::Flag(dev.is_crt()),
            Cell::Code(dev.icd_indication_code),
            Cell::Code(dev.ppm_indication_code),
            Cell::Flag(dev.indication_missing()),
            Cell::Flag(dev.mr_conditional),
            Cell::Code(dev.position_body_code),
            Cell::Flag(dev.left_chest),
            Cell::Flag(dev.right_chest),
            Cell::Flag(dev.leadless),
            Cell::Flag(dev.subq),
            Cell::Flag(dev.left_vs_other),
            Cell::Flag(dev.left_vs_other_coarse),
            Cell::Code(dev.manufacturer_code),
            Cell::Category(dev.manufacturer.map(|m| m.as_str())),
            Cell::Flag(dev.manufacturer_other()),
            Cell::Flag(dev.leads.atrial),
            Cell::Flag(dev.leads.ventricular),
            Cell::Flag(dev.leads.lv),
            Cell::Flag(dev.leads.subq),
            Cell::Count(Some(dev.leads.count())),
            Cell::Flag(dev.leads.lv),
            Cell::Flag(dev.leads.subq),
            Cell::Flag(geo.rotation),
            Cell::Float(geo.dist_card_sil_mm),
            Cell::Float(geo.dist_lv_apex_mm),
            Cell::Float(geo.widest_chest_mm),
            Cell::Float(geo.norm_dist_card_sil),
            Cell::Float(geo.norm_dist_lv_apex),
        ];

        for sequence in &self.sequences {
            cells.push(Cell::Flag(sequence.severe));
            cells.push(Cell::Float(sequence.ratio));
            for wall in Wall::ALL {
                cells.push(Cell::Flag(sequence.wall_severe[wall.index()]));
                cells.push(Cell::Flag(sequence.wall_clean(wall)));
            }
        }

        cells.push(Cell::Float(comp.artifact_burden));
        cells.push(Cell::Float(comp.max_ratio));
        cells.extend(comp.wall_clean.iter().map(|clean| Cell::Count(*clean)));
        cells.push(Cell::Count(comp.lv_visibility_score));
        cells.push(Cell::Flag(comp.cause.ipg));
        cells.push(Cell::Flag(comp.cause.lead));
        cells.push(Cell::Flag(comp.cause.both));
        cells.extend(self.sequences.iter().map(|s| Cell::Flag(s.available)));

        cells.push(Cell::Flag(out.non_diagnostic));
        cells.push(Cell::Flag(out.add_info));
        cells.push(Cell::Flag(out.confirmed));
        cells.push(Cell::Flag(out.mgmt_change));
        cells.push(Cell::Flag(out.dx_change));
        cells.push(Cell::Count(Some(out.utility_score())));
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::canonical_columns;

    #[test]
    fn cells_follow_column_schema() {
        let record = CanonicalRecord::default();
        let cells = record.cells();
        let columns = canonical_columns();
        assert_eq!(cells.len(), columns.len());
        for (cell, column) in cells.iter().zip(&columns) {
            assert_eq!(cell.kind(), column.kind, "{}", column.name);
        }
    }

    #[test]
    fn dx_change_needs_both_codes() {
        let mut dx = Diagnosis {
            pre_code: Some(1.0),
            post_code: Some(2.0),
            ..Diagnosis::default()
        };
        assert_eq!(dx.changed(), 1);
        dx.post_code = Some(1.0);
        assert_eq!(dx.changed(), 0);
        dx.pre_code = None;
        dx.post_code = Some(2.0);
        assert_eq!(dx.changed(), 0);
    }

    #[test]
    fn utility_score_combines_outcomes() {
        let outcomes = Outcomes {
            non_diagnostic: 1,
            add_info: 1,
            confirmed: 0,
            mgmt_change: 1,
            dx_change: 0,
        };
        assert_eq!(outcomes.utility_score(), 1);
    }

    #[test]
    fn causes_merge_with_or() {
        let a = CauseAttribution { ipg: 1, lead: 0, both: 0 };
        let b = CauseAttribution { ipg: 0, lead: 1, both: 0 };
        assert_eq!(a.merge(b), CauseAttribution { ipg: 1, lead: 1, both: 0 });
    }
}
