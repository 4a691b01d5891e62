//! Simple Good-Turing re-estimation of count frequencies, after Gale and
//! Sampson (1995). The caller hands in a map from each observed raw count
//! to the number of distinct items carrying that count; the result maps
//! each raw count to its smoothed value, with key `0` holding the total
//! count mass reserved for items never observed at all.
use crate::stats::Stats;
use log::warn;
use std::collections::BTreeMap;

/// A raw count used as a map key. Counts produced by the same sequence of
/// floating-point accumulations compare bit-equal, which is exactly the
/// grouping the frequency-of-counts table needs.
#[derive(Debug, Clone, Copy)]
pub struct Count(pub f64);

impl PartialEq for Count {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}
impl Eq for Count {}

impl std::hash::Hash for Count {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.to_bits());
    }
}

impl PartialOrd for Count {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Count {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

// Confidence width multiplier for the Turing-vs-LGT switch.
const SWITCH_FACTOR: f64 = 1.96;

/// Smooths the given frequency-of-counts table.
///
/// Counts may be fractional; the singleton mass (key exactly `1.0`) is what
/// gets reserved for unseen items, so a table without singletons yields a
/// zero at key `0` and the caller has to fall back to a minimum mass.
pub fn simple(freqs: &Stats<Count>) -> BTreeMap<Count, f64> {
    let mut rows: Vec<(f64, f64)> = freqs.iter().map(|(count, &n)| (count.0, n)).collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut out = BTreeMap::new();
    if rows.is_empty() {
        out.insert(Count(0.0), 0.0);
        return out;
    }
    let total: f64 = rows.iter().map(|&(r, n)| r * n).sum();
    let singletons = freqs.get(&Count(1.0));

    let slope = match fit_log_log(&rows) {
        Some((slope, _)) if slope < -1.0 => slope,
        Some((slope, _)) => {
            warn!(
                "frequency curve slope {:.3} is above -1; smoothing degenerates to rescaled raw counts",
                slope
            );
            return rescaled_identity(&rows, total, singletons);
        }
        None => return rescaled_identity(&rows, total, singletons),
    };
    let lgt = |r: f64| r * (1.0 + 1.0 / r).powf(slope + 1.0);

    // Turing estimates while they differ significantly from the smoothed
    // curve, then the curve for the rest of the tail.
    let mut smoothed = Vec::with_capacity(rows.len());
    let mut on_curve = false;
    for (i, &(r, n)) in rows.iter().enumerate() {
        let from_curve = lgt(r);
        if on_curve {
            smoothed.push(from_curve);
            continue;
        }
        let successor = rows
            .get(i + 1)
            .filter(|&&(next, _)| (next - r - 1.0).abs() < 1e-9)
            .map(|&(_, next_n)| next_n);
        match successor {
            Some(next_n) => {
                let turing = (r + 1.0) * next_n / n;
                let ratio = next_n / n;
                let width =
                    SWITCH_FACTOR * ((r + 1.0).powi(2) * (ratio / n) * (1.0 + ratio)).sqrt();
                if (turing - from_curve).abs() > width {
                    smoothed.push(turing);
                } else {
                    on_curve = true;
                    smoothed.push(from_curve);
                }
            }
            None => {
                on_curve = true;
                smoothed.push(from_curve);
            }
        }
    }

    // Renormalise so that the seen mass plus the unseen reserve equals the
    // empirical total.
    let seen_target = total - singletons;
    let seen_raw: f64 = rows.iter().zip(&smoothed).map(|(&(_, n), &s)| n * s).sum();
    if seen_target <= 0.0 || seen_raw <= 0.0 {
        return rescaled_identity(&rows, total, singletons);
    }
    let scale = seen_target / seen_raw;
    for (&(r, _), &s) in rows.iter().zip(&smoothed) {
        out.insert(Count(r), s * scale);
    }
    out.insert(Count(0.0), singletons);
    out
}

// Least-squares fit of ln(Z) against ln(r), where Z spreads each frequency
// over the half-open gap to its neighbouring counts. Needs two points.
fn fit_log_log(rows: &[(f64, f64)]) -> Option<(f64, f64)> {
    if rows.len() < 2 {
        return None;
    }
    let points: Vec<(f64, f64)> = rows
        .iter()
        .enumerate()
        .map(|(i, &(r, n))| {
            let q = if i == 0 { 0.0 } else { rows[i - 1].0 };
            let t = if i + 1 < rows.len() {
                rows[i + 1].0
            } else {
                2.0 * r - q
            };
            let z = n / (0.5 * (t - q));
            (r.ln(), z.ln())
        })
        .collect();
    let len = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / len;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / len;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum();
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

// Keeps the shape of the raw counts but scales them down so the singleton
// reserve still fits under the empirical total. When even that is
// impossible (all mass sits in singletons) the counts pass through
// untouched and nothing is reserved.
fn rescaled_identity(rows: &[(f64, f64)], total: f64, singletons: f64) -> BTreeMap<Count, f64> {
    let mut out = BTreeMap::new();
    if total - singletons > 0.0 {
        let scale = (total - singletons) / total;
        for &(r, _) in rows {
            out.insert(Count(r), r * scale);
        }
        out.insert(Count(0.0), singletons);
    } else {
        warn!("all joint mass sits in singletons; counts pass through unsmoothed");
        for &(r, _) in rows {
            out.insert(Count(r), r);
        }
        out.insert(Count(0.0), 0.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(f64, f64)]) -> Stats<Count> {
        entries.iter().map(|&(r, n)| (Count(r), n)).collect()
    }

    #[test]
    fn reserves_singleton_mass_for_unseen() {
        // A Zipf-like frequency curve with a steep tail.
        let freqs = table(&[
            (1.0, 120.0),
            (2.0, 40.0),
            (3.0, 24.0),
            (4.0, 13.0),
            (5.0, 15.0),
            (6.0, 5.0),
            (7.0, 11.0),
            (8.0, 2.0),
            (9.0, 2.0),
            (10.0, 1.0),
        ]);
        let smoothed = simple(&freqs);
        assert_eq!(smoothed[&Count(0.0)], 120.0);
        for (&count, &value) in smoothed.iter() {
            if count != Count(0.0) {
                assert!(value > 0.0, "non-positive smoothed count for {:?}", count);
            }
        }
    }

    #[test]
    fn conserves_total_mass() {
        let entries = [
            (1.0, 120.0),
            (2.0, 40.0),
            (3.0, 24.0),
            (4.0, 13.0),
            (5.0, 15.0),
            (6.0, 5.0),
            (7.0, 11.0),
            (10.0, 1.0),
        ];
        let freqs = table(&entries);
        let total: f64 = entries.iter().map(|&(r, n)| r * n).sum();
        let smoothed = simple(&freqs);
        let seen: f64 = entries
            .iter()
            .map(|&(r, n)| n * smoothed[&Count(r)])
            .sum();
        assert!((seen + smoothed[&Count(0.0)] - total).abs() < 1e-6);
    }

    #[test]
    fn smoothed_singleton_count_shrinks() {
        let freqs = table(&[(1.0, 100.0), (2.0, 30.0), (3.0, 10.0), (4.0, 4.0)]);
        let smoothed = simple(&freqs);
        assert!(smoothed[&Count(1.0)] < 1.0);
    }

    #[test]
    fn single_distinct_count_passes_through() {
        let freqs = table(&[(2.0, 4.0)]);
        let smoothed = simple(&freqs);
        assert_eq!(smoothed[&Count(2.0)], 2.0);
        assert_eq!(smoothed[&Count(0.0)], 0.0);
    }

    #[test]
    fn no_singletons_reserves_nothing() {
        let freqs = table(&[(2.0, 4.0), (3.0, 2.0), (5.0, 1.0)]);
        let smoothed = simple(&freqs);
        assert_eq!(smoothed[&Count(0.0)], 0.0);
    }

    #[test]
    fn all_singletons_pass_through() {
        let freqs = table(&[(1.0, 7.0)]);
        let smoothed = simple(&freqs);
        assert_eq!(smoothed[&Count(1.0)], 1.0);
        assert_eq!(smoothed[&Count(0.0)], 0.0);
    }

    #[test]
    fn empty_table_yields_empty_reserve() {
        let freqs: Stats<Count> = Stats::new();
        let smoothed = simple(&freqs);
        assert_eq!(smoothed[&Count(0.0)], 0.0);
        assert_eq!(smoothed.len(), 1);
    }

    #[test]
    fn fractional_counts_are_accepted() {
        let freqs = table(&[(0.5, 30.0), (1.5, 10.0), (2.5, 3.0), (4.0, 1.0)]);
        let smoothed = simple(&freqs);
        // No exact singletons, so nothing is reserved, but every observed
        // count still gets a finite smoothed value.
        assert_eq!(smoothed[&Count(0.0)], 0.0);
        for (&count, &value) in smoothed.iter() {
            if count != Count(0.0) {
                assert!(value.is_finite() && value > 0.0);
            }
        }
    }
}
