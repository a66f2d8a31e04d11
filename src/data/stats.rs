use std::collections::BTreeMap;

use super::model::{AlignedRecord, Pollutant, RegionAliasMap};

// ---------------------------------------------------------------------------
// Descriptive statistics per region
// ---------------------------------------------------------------------------

/// Summary of one pollutant within one region.
///
/// Every field but `count` is `None` when the group holds no values;
/// `std` is also `None` for a single value (sample standard deviation).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub region: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl GroupSummary {
    fn from_values(region: String, mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        let count = values.len();
        if count == 0 {
            return Self {
                region,
                count,
                mean: None,
                std: None,
                min: None,
                q25: None,
                median: None,
                q75: None,
                max: None,
            };
        }

        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        Self {
            region,
            count,
            mean: Some(mean),
            std,
            min: values.first().copied(),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Linearly interpolated quantile of already-sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Describe `field` grouped by region.
///
/// Groups are every region present in `records` plus every region listed
/// in `groups`, in name order. Both sides go through `aliases`, so a group
/// given by a historical name lands on the current one. NaN readings count
/// as missing.
pub fn describe<S: AsRef<str>>(
    records: &[AlignedRecord],
    field: Pollutant,
    groups: &[S],
    aliases: &RegionAliasMap,
) -> Vec<GroupSummary> {
    let mut by_region: BTreeMap<String, Vec<f64>> = groups
        .iter()
        .map(|g| (aliases.resolve(g.as_ref()).to_string(), Vec::new()))
        .collect();

    for r in records {
        let region = aliases.resolve(&r.region).to_string();
        let values = by_region.entry(region).or_default();
        if let Some(v) = r.get(field).filter(|v| !v.is_nan()) {
            values.push(v);
        }
    }

    by_region
        .into_iter()
        .map(|(region, values)| GroupSummary::from_values(region, values))
        .collect()
}

// ---------------------------------------------------------------------------
// Pairwise-complete Pearson correlation
// ---------------------------------------------------------------------------

/// Square matrix of correlation coefficients between pollutants.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub fields: Vec<Pollutant>,
    /// `cells[i][j]` correlates `fields[i]` with `fields[j]`.
    pub cells: Vec<Vec<Option<f64>>>,
    /// Number of complete pairs behind each cell.
    pub pair_counts: Vec<Vec<usize>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Pollutant, b: Pollutant) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.cells[i][j]
    }

    pub fn size(&self) -> usize {
        self.fields.len()
    }
}

/// Pearson correlation of every pair of `fields`, each pair computed over
/// the rows where both values are present.
///
/// The diagonal is always 1.0. A pair with fewer than two complete rows, or
/// with a constant side, has no coefficient.
pub fn correlate(records: &[AlignedRecord], fields: &[Pollutant]) -> CorrelationMatrix {
    let n = fields.len();
    let mut cells = vec![vec![None; n]; n];
    let mut pair_counts = vec![vec![0usize; n]; n];

    for i in 0..n {
        cells[i][i] = Some(1.0);
        pair_counts[i][i] = records
            .iter()
            .filter(|r| r.get(fields[i]).is_some_and(|v| !v.is_nan()))
            .count();

        for j in (i + 1)..n {
            let pairs: Vec<(f64, f64)> = records
                .iter()
                .filter_map(|r| Some((r.get(fields[i])?, r.get(fields[j])?)))
                .filter(|(x, y)| !x.is_nan() && !y.is_nan())
                .collect();

            let r = pearson(&pairs);
            cells[i][j] = r;
            cells[j][i] = r;
            pair_counts[i][j] = pairs.len();
            pair_counts[j][i] = pairs.len();
        }
    }

    CorrelationMatrix {
        fields: fields.to_vec(),
        cells,
        pair_counts,
    }
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    macro_rules! assert_approx {
        ($left:expr, $right:expr, $tol:expr) => {
            let (l, r) = ($left as f64, $right as f64);
            assert!(
                (l - r).abs() <= $tol,
                "assert_approx failed: left={}, right={}, diff={}, tol={}",
                l,
                r,
                (l - r).abs(),
                $tol
            );
        };
    }

    fn row(day: u32, region: &str, values: &[(Pollutant, f64)]) -> AlignedRecord {
        let date = NaiveDate::from_ymd_opt(2023, 6, day).unwrap();
        values
            .iter()
            .fold(AlignedRecord::new(date, region), |r, &(p, v)| r.with(p, v))
    }

    #[test]
    fn describe_uses_sample_std_and_linear_quartiles() {
        let records: Vec<_> = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| row(i as u32 + 1, "Suffolk", &[(Pollutant::Pm25, v)]))
            .collect();

        let stats = describe(
            &records,
            Pollutant::Pm25,
            &[] as &[&str],
            &RegionAliasMap::identity(),
        );
        assert_eq!(stats.len(), 1);
        let s = &stats[0];
        assert_eq!(s.count, 4);
        assert_approx!(s.mean.unwrap(), 2.5, 1e-12);
        assert_approx!(s.std.unwrap(), 1.2909944487358056, 1e-12);
        assert_eq!(s.min, Some(1.0));
        assert_approx!(s.q25.unwrap(), 1.75, 1e-12);
        assert_approx!(s.median.unwrap(), 2.5, 1e-12);
        assert_approx!(s.q75.unwrap(), 3.25, 1e-12);
        assert_eq!(s.max, Some(4.0));
    }

    #[test]
    fn describe_empty_region_yields_missing_stats() {
        let stats = describe(&[], Pollutant::Co, &["Philadelphia"], &RegionAliasMap::identity());
        assert_eq!(stats.len(), 1);
        let s = &stats[0];
        assert_eq!(s.region, "Philadelphia");
        assert_eq!(s.count, 0);
        assert!(s.mean.is_none() && s.std.is_none() && s.min.is_none());
        assert!(s.q25.is_none() && s.median.is_none() && s.q75.is_none() && s.max.is_none());
    }

    #[test]
    fn describe_resolves_historical_group_names() {
        let aliases = RegionAliasMap::epa_counties();
        let records = vec![
            row(1, "District of Columbia", &[(Pollutant::Pm25, 12.0)]),
            row(2, "District Of Columbia", &[(Pollutant::Pm25, 14.0)]),
        ];

        let stats = describe(&records, Pollutant::Pm25, &["District Of Columbia"], &aliases);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].region, "District of Columbia");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].mean, Some(13.0));
    }

    #[test]
    fn describe_group_without_field_values_has_zero_count() {
        let records = vec![
            row(1, "New York", &[(Pollutant::Co, 0.5)]),
            row(1, "Suffolk", &[(Pollutant::Ozone, 0.04)]),
        ];
        let stats = describe(&records, Pollutant::Co, &[] as &[&str], &RegionAliasMap::identity());
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].count, 1);
        assert_eq!(stats[0].std, None);
        assert_eq!(stats[1].region, "Suffolk");
        assert_eq!(stats[1].count, 0);
    }

    #[test]
    fn correlation_diagonal_is_one_and_matrix_symmetric() {
        let records = vec![
            row(1, "A", &[(Pollutant::Pm25, 1.0), (Pollutant::Co, 2.0), (Pollutant::Ozone, 9.0)]),
            row(2, "A", &[(Pollutant::Pm25, 2.0), (Pollutant::Co, 4.1), (Pollutant::Ozone, 7.0)]),
            row(3, "A", &[(Pollutant::Pm25, 3.0), (Pollutant::Co, 5.9), (Pollutant::Ozone, 8.0)]),
            row(4, "A", &[(Pollutant::Pm25, 4.0), (Pollutant::Ozone, 1.0)]),
        ];
        let m = correlate(&records, &Pollutant::ALL);

        for i in 0..m.size() {
            assert_eq!(m.cells[i][i], Some(1.0));
            for j in 0..m.size() {
                assert_eq!(m.cells[i][j], m.cells[j][i]);
                if let Some(r) = m.cells[i][j] {
                    assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
        assert!(m.get(Pollutant::Pm25, Pollutant::Co).unwrap() > 0.99);
        assert!(m.get(Pollutant::Pm25, Pollutant::Ozone).unwrap() < 0.0);
    }

    #[test]
    fn correlation_uses_pairwise_complete_rows() {
        // PM2.5/CO share rows 1-3; CO is missing on row 4 but that must not
        // shrink the PM2.5/Ozone pair.
        let records = vec![
            row(1, "A", &[(Pollutant::Pm25, 1.0), (Pollutant::Co, 1.0), (Pollutant::Ozone, 1.0)]),
            row(2, "A", &[(Pollutant::Pm25, 2.0), (Pollutant::Co, 2.0), (Pollutant::Ozone, 2.0)]),
            row(3, "A", &[(Pollutant::Pm25, 3.0), (Pollutant::Co, 3.0), (Pollutant::Ozone, 3.0)]),
            row(4, "A", &[(Pollutant::Pm25, 4.0), (Pollutant::Ozone, 0.0)]),
        ];
        let m = correlate(&records, &[Pollutant::Pm25, Pollutant::Co, Pollutant::Ozone]);
        assert_approx!(m.get(Pollutant::Pm25, Pollutant::Co).unwrap(), 1.0, 1e-12);
        assert!(m.get(Pollutant::Pm25, Pollutant::Ozone).unwrap() < 1.0);
        assert_eq!(m.pair_counts[0][1], 3);
        assert_eq!(m.pair_counts[0][2], 4);
    }

    #[test]
    fn correlation_with_too_few_pairs_is_missing() {
        let records = vec![
            row(1, "A", &[(Pollutant::Pm25, 1.0), (Pollutant::No2, 3.0)]),
            row(2, "A", &[(Pollutant::Pm25, 2.0)]),
        ];
        let m = correlate(&records, &[Pollutant::Pm25, Pollutant::No2]);
        assert_eq!(m.get(Pollutant::Pm25, Pollutant::No2), None);
        assert_eq!(m.get(Pollutant::No2, Pollutant::No2), Some(1.0));
    }

    #[test]
    fn correlation_with_constant_side_is_missing() {
        let records = vec![
            row(1, "A", &[(Pollutant::Pm25, 1.0), (Pollutant::Co, 3.0)]),
            row(2, "A", &[(Pollutant::Pm25, 2.0), (Pollutant::Co, 3.0)]),
        ];
        let m = correlate(&records, &[Pollutant::Pm25, Pollutant::Co]);
        assert_eq!(m.get(Pollutant::Pm25, Pollutant::Co), None);
    }

    #[test]
    fn quantile_of_single_value_is_that_value() {
        assert_eq!(quantile(&[7.0], 0.25), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }
}
