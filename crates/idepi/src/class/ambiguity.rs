//! Resolution of samples whose replicates disagree.

/// Labels after ambiguity resolution.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Resolution {
    pub labels: Vec<bool>,
    pub ambiguous: usize,
    pub resolved_positive: usize,
}

/// How many of `ambiguous` samples to call positive so that `total` samples
/// with an observed positive fraction of `fraction` move towards an even split.
///
/// `round((0.5 - fraction) * total)` with halves rounded up, clamped to
/// `[0, ambiguous]`.
pub fn positive_quota(fraction: f64, total: usize, ambiguous: usize) -> usize {
    let raw = ((0.5 - fraction) * total as f64 + 0.5).floor();
    if raw > 0.0 {
        (raw as usize).min(ambiguous)
    } else {
        0
    }
}

/// Label every sample, resolving disagreeing ones towards balance.
///
/// Unanimous samples take their common label. Of the ambiguous samples, the
/// [`positive_quota`] with the largest maximum values become positive (ties
/// in encounter order); the rest are negative.
pub(super) fn resolve(samples: &[Vec<f64>], discretize: impl Fn(f64) -> bool) -> Resolution {
    let total = samples.len();
    let mut labels = vec![false; total];
    let mut ambiguous: Vec<usize> = Vec::new();
    let mut positives = 0usize;

    for (i, values) in samples.iter().enumerate() {
        let classes: Vec<bool> = values.iter().map(|&v| discretize(v)).collect();
        match classes.split_first() {
            Some((&first, rest)) if rest.iter().all(|&c| c == first) => {
                labels[i] = first;
                positives += usize::from(first);
            }
            Some(_) => ambiguous.push(i),
            None => {}
        }
    }

    let unambiguous = total - ambiguous.len();
    let fraction = if unambiguous == 0 {
        0.0
    } else {
        positives as f64 / unambiguous as f64
    };
    let quota = positive_quota(fraction, total, ambiguous.len());

    // stable, so equal maxima stay in encounter order
    let peak = |i: usize| samples[i].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    ambiguous.sort_by(|&a, &b| peak(b).total_cmp(&peak(a)));
    for &i in ambiguous.iter().take(quota) {
        labels[i] = true;
    }

    log::debug!(
        "found {} ambiguous in {} records, {} resolved positive",
        ambiguous.len(),
        total,
        quota
    );

    Resolution {
        labels,
        ambiguous: ambiguous.len(),
        resolved_positive: quota,
    }
}
