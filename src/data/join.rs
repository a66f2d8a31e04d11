//! Full outer join of pollutant series on (date, region).
//!
//! Region names go through the [`RegionAliasMap`] before any key is
//! compared, so a renamed county in an older export lines up with its
//! current name in a newer one.
//!
//! Duplicate keys inside one series (several stations in the same county)
//! are not collapsed: each left row is paired with every matching right
//! reading, the usual outer-join cartesian expansion. Callers that want one
//! row per key aggregate before merging.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::{AlignedRecord, PollutantSeries, RegionAliasMap};

type JoinKey = (NaiveDate, String);

/// Outer-join every series on (date, alias-resolved region).
///
/// Series are folded left to right. Rows are returned in key order; the
/// order is not part of the contract.
pub fn merge(series: &[PollutantSeries], aliases: &RegionAliasMap) -> Vec<AlignedRecord> {
    let mut rows: Vec<AlignedRecord> = Vec::new();

    for s in series {
        let mut right: BTreeMap<JoinKey, Vec<f64>> = BTreeMap::new();
        for reading in &s.readings {
            let key = (reading.date, aliases.resolve(&reading.region).to_string());
            right.entry(key).or_default().push(reading.value);
        }

        let left_keys: BTreeSet<JoinKey> = rows
            .iter()
            .map(|r| (r.date, r.region.clone()))
            .collect();

        let mut merged = Vec::with_capacity(rows.len().max(s.len()));
        for row in rows {
            match right.get(&(row.date, row.region.clone())) {
                Some(values) => {
                    for &v in values {
                        merged.push(row.clone().with(s.pollutant, v));
                    }
                }
                None => merged.push(row),
            }
        }

        for ((date, region), values) in right {
            if left_keys.contains(&(date, region.clone())) {
                continue;
            }
            for v in values {
                merged.push(AlignedRecord::new(date, region.clone()).with(s.pollutant, v));
            }
        }

        rows = merged;
    }

    rows.sort_by(|a, b| (a.date, &a.region).cmp(&(b.date, &b.region)));
    log::debug!("Merged {} series into {} aligned rows", series.len(), rows.len());
    rows
}
