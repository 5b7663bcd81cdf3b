//! Turns raw crossing records into their public representation.

use std::sync::Arc;

use crate::models::{CrossingRecord, CrossingView, CROSSING_FLAG};
use crate::services::lookup::LookupTables;
use crate::utils::time::format_timestamp;

#[derive(Debug, Clone)]
pub struct Enricher {
    tables: Arc<LookupTables>,
}

impl Enricher {
    pub fn new(tables: Arc<LookupTables>) -> Self {
        Self { tables }
    }

    pub fn enrich(&self, record: &CrossingRecord) -> CrossingView {
        let color = self.tables.plate_color(record.hpys.as_deref());
        let direction = self.tables.direction(record.xsfxdm);
        let kkdd_id = record
            .kkbh
            .as_deref()
            .map(|code| self.tables.checkpoint_id(code).to_string());

        CrossingView {
            id: record.clxxbh,
            hphm: record.hphm.clone(),
            jgsj: record.jgsk.as_ref().map(format_timestamp),
            hpys: color.name.clone(),
            hpys_id: color.id,
            hpys_code: color.code.clone(),
            kkdd: record.kkmc.clone(),
            kkdd_id,
            kkbh: record.kkbh.clone(),
            fxbh: direction.name.clone(),
            fxbh_code: direction.code.clone(),
            cdbh: record.cdbh,
            clsd: record.clsd,
            hpzl: record.hpzl.clone(),
            clbj: CROSSING_FLAG.to_string(),
            cllx: record.cllx.clone(),
            csys: record.csys.clone(),
            imgurl: record.qjtp.clone(),
            imgurl2: record.hptp.clone(),
        }
    }
}
