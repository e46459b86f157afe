use rand::Rng;

use crate::error::{Cat5Error, Result};

pub fn clip_weights(weights: &[f64], min_w: f64, max_w: f64) -> Vec<f64> {
    let hi = max_w.max(min_w);
    weights.iter().map(|w| w.clamp(min_w, hi)).collect()
}

/// Scale weights to a distribution summing to 1. Non-positive and non-finite
/// weights become 0; an all-zero input stays all zero.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let cleaned: Vec<f64> = weights.iter().map(|w| sanitize(*w)).collect();
    let total: f64 = cleaned.iter().sum();
    if total <= 0.0 {
        return cleaned;
    }
    cleaned.into_iter().map(|w| w / total).collect()
}

/// Draw `count` distinct indices without replacement. Each draw picks an index
/// with probability proportional to its weight among the indices not yet
/// drawn. Zero-weight indices are never drawn.
pub fn sample_indices<R: Rng + ?Sized>(
    weights: &[f64],
    count: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let mut remaining: Vec<f64> = weights.iter().map(|w| sanitize(*w)).collect();
    let available = remaining.iter().filter(|w| **w > 0.0).count();
    if available < count {
        return Err(Cat5Error::InsufficientWeight {
            requested: count,
            available,
        });
    }

    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        let total: f64 = remaining.iter().sum();
        let target = rng.gen_range(0.0..1.0) * total;

        let mut acc = 0.0;
        let mut choice = None;
        for (idx, w) in remaining.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            acc += w;
            choice = Some(idx);
            if acc > target {
                break;
            }
        }
        // `choice` is the last positive index when rounding leaves `acc` short of `target`.
        let Some(idx) = choice else {
            return Err(Cat5Error::InsufficientWeight {
                requested: count,
                available: picked.len(),
            });
        };
        remaining[idx] = 0.0;
        picked.push(idx);
    }
    Ok(picked)
}

pub fn sample_without_replacement<'t, T, R: Rng + ?Sized>(
    items: &'t [T],
    weights: &[f64],
    count: usize,
    rng: &mut R,
) -> Result<Vec<&'t T>> {
    let n = items.len().min(weights.len());
    let idx = sample_indices(&weights[..n], count, rng)?;
    Ok(idx.into_iter().map(|i| &items[i]).collect())
}

fn sanitize(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 { w } else { 0.0 }
}
