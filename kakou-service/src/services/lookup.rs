//! Static code tables used to resolve raw crossing-record codes into display values.
//!
//! Tables are loaded once at start-up (from a JSON file or the built-in defaults)
//! and shared read-only behind an `Arc`.

use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateColor {
    pub id: i32,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    pub code: String,
    pub name: String,
}

pub const OTHER_CODE: &str = "QT";
pub const OTHER_NAME: &str = "其他";
pub const OTHER_COLOR_ID: i32 = 9;

#[derive(Debug, Clone, Deserialize)]
pub struct LookupTables {
    /// Raw plate colour code to colour entry.
    #[serde(default = "default_plate_colors")]
    plate_colors: HashMap<String, PlateColor>,
    /// Raw direction code to direction entry.
    #[serde(default = "default_directions")]
    directions: HashMap<i32, Direction>,
    /// Checkpoint code to display id.
    #[serde(default)]
    checkpoints: HashMap<String, String>,
    #[serde(skip, default = "other_color")]
    other_color: PlateColor,
    #[serde(skip, default = "other_direction")]
    other_direction: Direction,
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::new(default_plate_colors(), default_directions(), HashMap::new())
    }
}

impl LookupTables {
    pub fn new(
        plate_colors: HashMap<String, PlateColor>,
        directions: HashMap<i32, Direction>,
        checkpoints: HashMap<String, String>,
    ) -> Self {
        Self {
            plate_colors,
            directions,
            checkpoints,
            other_color: other_color(),
            other_direction: other_direction(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid lookup tables: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Failed to read lookup tables from {}: {}",
                path.display(),
                e
            ))
        })?;
        let tables = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            plate_colors = tables.plate_colors.len(),
            directions = tables.directions.len(),
            checkpoints = tables.checkpoints.len(),
            "Lookup tables loaded"
        );
        Ok(tables)
    }

    /// Colour entry for a raw code, or the "other" entry when unknown.
    pub fn plate_color(&self, code: Option<&str>) -> &PlateColor {
        code.and_then(|c| self.plate_colors.get(c))
            .unwrap_or(&self.other_color)
    }

    /// Direction entry for a raw code, or the "other" entry when unknown.
    pub fn direction(&self, code: Option<i32>) -> &Direction {
        code.and_then(|c| self.directions.get(&c))
            .unwrap_or(&self.other_direction)
    }

    /// Display id for a checkpoint code; unknown codes are echoed back.
    pub fn checkpoint_id<'a>(&'a self, code: &'a str) -> &'a str {
        self.checkpoints.get(code).map_or(code, String::as_str)
    }
}

fn other_color() -> PlateColor {
    PlateColor {
        id: OTHER_COLOR_ID,
        code: OTHER_CODE.to_string(),
        name: OTHER_NAME.to_string(),
    }
}

fn other_direction() -> Direction {
    Direction {
        code: OTHER_CODE.to_string(),
        name: OTHER_NAME.to_string(),
    }
}

fn default_plate_colors() -> HashMap<String, PlateColor> {
    [
        ("白", 1, "WT", "白牌"),
        ("黄", 2, "YL", "黄牌"),
        ("蓝", 3, "BU", "蓝牌"),
        ("黑", 4, "BK", "黑牌"),
        ("绿", 5, "GN", "绿牌"),
    ]
    .into_iter()
    .map(|(raw, id, code, name)| {
        (
            raw.to_string(),
            PlateColor {
                id,
                code: code.to_string(),
                name: name.to_string(),
            },
        )
    })
    .collect()
}

fn default_directions() -> HashMap<i32, Direction> {
    [
        (1, "JC", "进城"),
        (2, "CC", "出城"),
        (3, "XD", "西往东"),
        (4, "DX", "东往西"),
        (5, "NB", "南往北"),
        (6, "BN", "北往南"),
    ]
    .into_iter()
    .map(|(raw, code, name)| {
        (
            raw,
            Direction {
                code: code.to_string(),
                name: name.to_string(),
            },
        )
    })
    .collect()
}
