//! Checkpoint model - monitoring locations from the kakou view `v_kkxx`.

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Read-only reference row; coordinates are kept as the decimal strings stored upstream.
#[derive(Debug, Clone, FromRow)]
pub struct Checkpoint {
    pub kkid: i64,
    pub kkdm: Option<String>,
    pub kkmc: Option<String>,
    pub wd: Option<String>,
    pub jd: Option<String>,
}

impl Checkpoint {
    pub fn view(&self) -> CheckpointView {
        CheckpointView {
            id: self.kkid,
            kkdm: self.kkdm.clone(),
            kkmc: self.kkmc.clone(),
            wd: self.wd.clone(),
            jd: self.jd.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckpointView {
    pub id: i64,
    /// Checkpoint code.
    pub kkdm: Option<String>,
    /// Checkpoint name.
    pub kkmc: Option<String>,
    /// Latitude.
    #[schema(example = "22.930533")]
    pub wd: Option<String>,
    /// Longitude.
    #[schema(example = "113.923485")]
    pub jd: Option<String>,
}
