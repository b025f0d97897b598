//! Feature builder behaviour over small raw tables.

use cied_ingest::{RawCell, RawTable};
use cied_model::{DeviceCategory, DiagnosisCategory, canonical_columns};
use cied_transform::{build_canonical_frame, build_records};
use polars::prelude::DataType;

const DEVICE: &str = "Type of Device (ICD =1 PPM = 2 CRT = 3)";
const PRE_DX: &str = "Pre-MR diagnosis/suspected_simplified (1=infiltrative,2=valvulopathy,3=HOCM,4=myopericarditis,5=ischemia,6=other unexplained CMP,7=Othe, 8= VT)";
const POST_DX: &str = "Post-MR diagnosis/suspected_simplified (1=infiltrative,2=valvulopathy,3=HOCM,4=myopericarditis,5=ischemia,6=other unexplained CMP,7=Othe, 8= VT)";

fn table(headers: &[&str], rows: Vec<Vec<RawCell>>) -> RawTable {
    let headers: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
    RawTable::from_rows(&headers, rows).unwrap()
}

fn num(v: f64) -> RawCell {
    RawCell::Number(v)
}

fn text(v: &str) -> RawCell {
    RawCell::Text(v.to_string())
}

#[test]
fn scenario_row_maps_to_canonical_fields() {
    let raw = table(
        &["Sex (1-M)", DEVICE, PRE_DX, POST_DX, "Non-diagnostic"],
        vec![vec![text("M"), num(3.0), num(2.0), num(5.0), text("No")]],
    );
    let records = build_records(&raw);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.demographics.sex_male, 1);
    assert_eq!(record.device.category, Some(DeviceCategory::Crt));
    assert_eq!(record.device.is_crt(), 1);
    assert_eq!(record.diagnosis.pre, Some(DiagnosisCategory::Valvular));
    assert_eq!(record.diagnosis.post, Some(DiagnosisCategory::Ischemia));
    assert_eq!(record.outcomes.dx_change, 1);
    assert_eq!(record.outcomes.non_diagnostic, 0);
    assert_eq!(record.outcomes.utility_score(), 1);
}

#[test]
fn frame_columns_follow_schema_order() {
    let raw = table(&["Age"], vec![vec![num(60.0)], vec![RawCell::Empty]]);
    let df = build_canonical_frame(&raw).unwrap();
    let expected: Vec<String> = canonical_columns().into_iter().map(|c| c.name).collect();
    let actual: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(actual, expected);
    assert_eq!(df.height(), 2);
    assert_eq!(df.column("age").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("sex_male").unwrap().dtype(), &DataType::Int32);
    assert_eq!(df.column("device_cat").unwrap().dtype(), &DataType::String);
}

#[test]
fn absent_columns_read_as_missing_or_zero() {
    let raw = table(&["Age"], vec![vec![num(60.0)]]);
    let df = build_canonical_frame(&raw).unwrap();
    for flag in ["hf", "mr_conditional", "NonDiagnostic", "has_TFE", "cause_IPG"] {
        assert_eq!(df.column(flag).unwrap().null_count(), 0, "{flag}");
    }
    for nullable in ["bmi", "device_cat", "artifact_burden", "norm_dist_card_sil"] {
        assert_eq!(df.column(nullable).unwrap().null_count(), 1, "{nullable}");
    }
    let record = &build_records(&raw)[0];
    assert_eq!(record.composites.lv_visibility_score, Some(4));
    assert_eq!(record.sequences[0].wall_clean(cied_model::Wall::Lateral), 1);
}

#[test]
fn unrecognized_and_out_of_range_values_are_repaired() {
    let raw = table(
        &[DEVICE, PRE_DX, "HF (1=Y)", "Age"],
        vec![
            vec![num(7.0), num(9.0), text("maybe"), text("n/a")],
            vec![text("ICD"), RawCell::Empty, text("Yes"), num(55.0)],
        ],
    );
    let records = build_records(&raw);
    assert_eq!(records[0].device.category, None);
    assert_eq!(records[0].diagnosis.pre, None);
    assert_eq!(records[0].diagnosis.pre_code, Some(9.0));
    assert_eq!(records[0].comorbidities.hf, 0);
    assert_eq!(records[0].demographics.age, None);
    assert_eq!(records[1].device.category, None);
    assert_eq!(records[1].comorbidities.hf, 1);
    assert_eq!(records[1].demographics.age, Some(55.0));
}

#[test]
fn normalized_distances_guard_the_denominator() {
    let raw = table(
        &[
            "CXR- PPM to cardiac silhouette - shortest (mm)",
            "PPM to LV Apex",
            "Widest Chest Transverse Diameter",
        ],
        vec![
            vec![num(50.0), num(80.0), num(200.0)],
            vec![num(50.0), num(80.0), num(0.0)],
            vec![num(50.0), RawCell::Empty, RawCell::Empty],
        ],
    );
    let records = build_records(&raw);
    assert_eq!(records[0].geometry.norm_dist_card_sil, Some(0.25));
    assert_eq!(records[0].geometry.norm_dist_lv_apex, Some(0.4));
    assert_eq!(records[1].geometry.norm_dist_card_sil, None);
    assert_eq!(records[2].geometry.norm_dist_lv_apex, None);
}

#[test]
fn per_sequence_artefact_and_walls() {
    let raw = table(
        &[
            "Any artefact (grade 3 or above)",
            "Any artefact (grade 3 or above).1",
            "Artefact ratio (biventricular)",
            "Artefact ratio (biventricular).2",
            "B_Anterior.1",
            "M_Anterior.1",
            "A_Septal.2",
            "CINE_SSFP (exact sequence listed)",
        ],
        vec![vec![
            num(0.0),
            num(2.0),
            num(0.2),
            num(0.6),
            num(1.0),
            num(3.0),
            num(4.0),
            text("bSSFP 2ch/4ch"),
        ]],
    );
    let record = &build_records(&raw)[0];
    assert_eq!(record.sequences[0].severe, 0);
    assert_eq!(record.sequences[1].severe, 1);
    assert_eq!(record.sequences[2].severe, 0);
    let burden = record.composites.artifact_burden.unwrap();
    assert!((burden - 0.4).abs() < 1e-12);
    assert_eq!(record.composites.max_ratio, Some(0.6));

    use cied_model::Wall;
    assert_eq!(record.sequences[1].wall_severe[Wall::Anterior.index()], 1);
    assert_eq!(record.sequences[2].wall_severe[Wall::Septal.index()], 1);
    assert_eq!(record.composites.wall_clean[Wall::Anterior.index()], Some(0));
    assert_eq!(record.composites.wall_clean[Wall::Lateral.index()], Some(1));
    assert_eq!(record.composites.lv_visibility_score, Some(2));
    assert_eq!(
        [
            record.sequences[0].available,
            record.sequences[1].available,
            record.sequences[2].available
        ],
        [0, 1, 0]
    );
}

#[test]
fn cause_columns_reconcile_per_sequence() {
    let raw = table(
        &[
            "Cause of Artifact (1=IPG, 2=Lead, 3=Both, 0=None)",
            "RV Artefact cause (Lead alone=1, lead and device=2, neither=3,IPG=4)",
            "Cause of Artifact (1=IPG, 2=Lead, 3=Both, 0=None).2",
            "RV Artefact cause (Lead alone=1, lead and device=2, neither=3, IPG=4).1",
        ],
        vec![
            vec![num(0.0), num(4.0), RawCell::Empty, RawCell::Empty],
            vec![num(0.0), num(3.0), num(3.0), num(1.0)],
        ],
    );
    let records = build_records(&raw);
    let first = records[0].composites.cause;
    assert_eq!((first.ipg, first.lead, first.both), (1, 0, 0));
    let second = records[1].composites.cause;
    assert_eq!((second.ipg, second.lead, second.both), (0, 1, 1));
}

#[test]
fn subq_code_three_is_not_a_lead() {
    let raw = table(
        &["SubQ lead - (0=no,1=yes,3=other (leadless)", "LV lead Yes/No"],
        vec![vec![num(3.0), text("yes")], vec![num(1.0), text("no")]],
    );
    let records = build_records(&raw);
    assert_eq!(records[0].device.leads.subq, 0);
    assert_eq!(records[0].device.leads.count(), 1);
    assert_eq!(records[1].device.leads.subq, 1);
    assert_eq!(records[1].device.leads.count(), 1);
}
