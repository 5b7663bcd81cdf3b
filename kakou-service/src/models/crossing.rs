//! Crossing record model - one observed vehicle passage from the kakou view `v_gcxx`.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Raw observation as stored upstream. Append-only; this service never writes it.
#[derive(Debug, Clone, FromRow)]
pub struct CrossingRecord {
    pub clxxbh: i64,
    /// Checkpoint code.
    pub kkbh: Option<String>,
    /// Checkpoint name.
    pub kkmc: Option<String>,
    /// Capture time, local wall clock.
    pub jgsk: Option<NaiveDateTime>,
    /// Lane number.
    pub cdbh: Option<i32>,
    /// Plate number.
    pub hphm: Option<String>,
    /// Raw plate colour code.
    pub hpys: Option<String>,
    /// Raw travel direction code.
    pub xsfxdm: Option<i32>,
    /// Vehicle type code.
    pub cllx: Option<String>,
    /// Body colour code.
    pub csys: Option<String>,
    /// Plate type code.
    pub hpzl: Option<String>,
    /// Speed.
    pub clsd: Option<i32>,
    /// Plate close-up image.
    pub hptp: Option<String>,
    /// Panorama image.
    pub qjtp: Option<String>,
}

/// Literal emitted in every record's `clbj` field.
pub const CROSSING_FLAG: &str = "F";

/// Public record shape: raw codes next to their resolved display values.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CrossingView {
    pub id: i64,
    #[schema(example = "粤L12345")]
    pub hphm: Option<String>,
    #[schema(example = "2017-03-09 07:05:01")]
    pub jgsj: Option<String>,
    pub hpys: String,
    pub hpys_id: i32,
    pub hpys_code: String,
    pub kkdd: Option<String>,
    pub kkdd_id: Option<String>,
    pub kkbh: Option<String>,
    pub fxbh: String,
    pub fxbh_code: String,
    pub cdbh: Option<i32>,
    pub clsd: Option<i32>,
    pub hpzl: Option<String>,
    /// Always [`CROSSING_FLAG`].
    pub clbj: String,
    pub cllx: Option<String>,
    pub csys: Option<String>,
    pub imgurl: Option<String>,
    pub imgurl2: Option<String>,
}

/// Inclusive bounds on the crossing record id; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}
