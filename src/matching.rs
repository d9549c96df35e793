// src/matching.rs
//
// Similarity search: slide the query trace over the reference trace and
// score every alignment. Three metrics with different robustness and cost
// trade-offs share one candidate shape so rankings stay comparable.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::signal::EnfSeries;

/// One candidate alignment: the reference window starting at `offset`
/// scored against the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Start index of the window within the reference series.
    pub offset: usize,
    /// Metric value; the ranking direction depends on the matcher.
    pub score: f64,
}

/// Tuning for the matrix-profile matcher.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StumpConfig {
    /// Optional cap on the distance profile, expressed in standard
    /// deviations below its mean: candidates above
    /// `max(mean(D) - k * std(D), min(D))` are dropped. `None` keeps every
    /// window.
    pub max_distance_sigmas: Option<f64>,
}

/// Pearson correlation of the query against every reference window, best
/// (highest coefficient) first.
///
/// Mean-centering makes the score insensitive to level and scale; only the
/// shape of the trace matters. A zero-variance query or window has no
/// defined correlation: its score is NaN and it ranks after every finite
/// score.
pub fn pmcc(query: &EnfSeries, reference: &EnfSeries) -> Vec<MatchCandidate> {
    let q = query.frequencies();
    let t = reference.frequencies();
    let m = q.len();
    if m > t.len() {
        return Vec::new();
    }

    let mean_q = mean(q);
    let centered_q: Vec<f64> = q.iter().map(|x| x - mean_q).collect();
    let var_q: f64 = centered_q.iter().map(|x| x * x).sum();

    let mut candidates: Vec<MatchCandidate> = (0..=t.len() - m)
        .map(|offset| {
            let window = &t[offset..offset + m];
            let mean_w = mean(window);
            let mut var_w = 0.0;
            let mut dot = 0.0;
            for (cq, &w) in centered_q.iter().zip(window) {
                let cw = w - mean_w;
                var_w += cw * cw;
                dot += cq * cw;
            }
            MatchCandidate {
                offset,
                score: dot / (var_q * var_w).sqrt(),
            }
        })
        .collect();

    candidates.sort_by(compare_descending);
    candidates
}

/// Plain Euclidean distance of the query against every reference window,
/// best (smallest distance) first.
///
/// No normalization: the cheap baseline, sensitive to level offsets between
/// query and reference.
pub fn euclidean(query: &EnfSeries, reference: &EnfSeries) -> Vec<MatchCandidate> {
    let q = query.frequencies();
    let t = reference.frequencies();
    let m = q.len();
    if m > t.len() {
        return Vec::new();
    }

    let mut candidates: Vec<MatchCandidate> = (0..=t.len() - m)
        .map(|offset| {
            let dist_sq: f64 = q
                .iter()
                .zip(&t[offset..offset + m])
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            MatchCandidate {
                offset,
                score: dist_sq.sqrt(),
            }
        })
        .collect();

    candidates.sort_by(compare_ascending);
    candidates
}

/// Matrix-profile search: z-normalized Euclidean distance of the query
/// against every reference window, best (smallest distance) first.
pub fn stump(query: &EnfSeries, reference: &EnfSeries) -> Vec<MatchCandidate> {
    stump_with(&StumpConfig::default(), query, reference)
}

/// [`stump`] with explicit tuning.
pub fn stump_with(
    config: &StumpConfig,
    query: &EnfSeries,
    reference: &EnfSeries,
) -> Vec<MatchCandidate> {
    let q = query.frequencies();
    let t = reference.frequencies();
    let m = q.len();
    if m > t.len() {
        return Vec::new();
    }

    let mean_q = mean(q);
    let centered_q: Vec<f64> = q.iter().map(|x| x - mean_q).collect();
    let std_q = (centered_q.iter().map(|x| x * x).sum::<f64>() / m as f64).sqrt();
    let q_flat = is_constant(q);

    let mut candidates: Vec<MatchCandidate> = (0..=t.len() - m)
        .map(|offset| MatchCandidate {
            offset,
            score: z_normalized_distance(&centered_q, std_q, q_flat, &t[offset..offset + m]),
        })
        .collect();

    if let Some(sigmas) = config.max_distance_sigmas {
        apply_distance_cap(&mut candidates, sigmas);
    }

    candidates.sort_by(compare_ascending);
    candidates
}

/// Distance between the query and one window after z-normalizing both:
/// `sqrt(2m (1 - r))` with `r` their Pearson correlation.
///
/// Flat subsequences carry no shape to normalize, so the matrix-profile
/// conventions apply: two flat sequences are identical (distance 0), one
/// flat against one varying is maximally far (`sqrt(m)`).
fn z_normalized_distance(centered_q: &[f64], std_q: f64, q_flat: bool, window: &[f64]) -> f64 {
    let m = centered_q.len() as f64;
    let w_flat = is_constant(window);
    if q_flat && w_flat {
        return 0.0;
    }
    if q_flat || w_flat {
        return m.sqrt();
    }

    let mean_w = mean(window);
    let mut var_w = 0.0;
    let mut dot = 0.0;
    for (cq, &w) in centered_q.iter().zip(window) {
        let cw = w - mean_w;
        var_w += cw * cw;
        dot += cq * cw;
    }
    let std_w = (var_w / m).sqrt();
    let r = dot / (m * std_q * std_w);
    (2.0 * m * (1.0 - r)).max(0.0).sqrt()
}

fn apply_distance_cap(candidates: &mut Vec<MatchCandidate>, sigmas: f64) {
    if candidates.is_empty() {
        return;
    }
    let scores: Vec<f64> = candidates.iter().map(|c| c.score).collect();
    let mean_d = mean(&scores);
    let var_d = scores
        .iter()
        .map(|d| (d - mean_d) * (d - mean_d))
        .sum::<f64>()
        / scores.len() as f64;
    let min_d = scores.iter().copied().fold(f64::INFINITY, f64::min);

    // The floor at min(D) keeps at least the best candidate even when the
    // cap lands below every distance.
    let cap = (mean_d - sigmas * var_d.sqrt()).max(min_d);
    candidates.retain(|c| c.score <= cap);
}

fn compare_ascending(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    a.score.total_cmp(&b.score)
}

// Descending by score with NaN after every finite value; sort_by is stable,
// so equal scores keep ascending offset order.
fn compare_descending(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    match (a.score.is_nan(), b.score.is_nan()) {
        (false, false) => b.score.total_cmp(&a.score),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}
