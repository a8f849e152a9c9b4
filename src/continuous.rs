//! Continuous Split
//!
//! Threshold search for one numeric attribute at one node. Cuts are only considered at
//! class boundaries between neighbouring distinct values.
use crate::data::{AttributeId, Dataset};
use crate::encoder::Encoder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub struct ContinuousSplit {
    attribute: AttributeId,
    /// Distinct values, ascending.
    values: Vec<f64>,
    /// Label counts of the rows holding each distinct value.
    counts: Vec<Vec<usize>>,
}

// The only label present, if exactly one is.
fn single_label(counts: &[usize]) -> Option<usize> {
    let mut present = counts.iter().enumerate().filter(|(_, c)| **c > 0);
    match (present.next(), present.next()) {
        (Some((label, _)), None) => Some(label),
        _ => None,
    }
}

impl ContinuousSplit {
    pub fn new(data: &Dataset, attribute: AttributeId) -> Self {
        let n_classes = data.table().n_classes();
        let mut pairs = data.numeric_pairs(attribute);
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut values: Vec<f64> = Vec::new();
        let mut counts: Vec<Vec<usize>> = Vec::new();
        for (v, label) in pairs {
            if values.last() != Some(&v) {
                values.push(v);
                counts.push(vec![0; n_classes]);
            }
            if let Some(c) = counts.last_mut() {
                c[label as usize] += 1;
            }
        }
        ContinuousSplit {
            attribute,
            values,
            counts,
        }
    }

    pub fn attribute(&self) -> AttributeId {
        self.attribute
    }

    pub fn unique_values(&self) -> usize {
        self.values.len()
    }

    /// Bits needed to announce which of the `unique_values - 1` gaps holds the cut.
    pub fn cut_bits(&self) -> f64 {
        if self.values.len() < 2 {
            0.0
        } else {
            ((self.values.len() - 1) as f64).log2()
        }
    }

    // Gap `k` lies between values[k] and values[k + 1]. Gaps between two runs of
    // the same single label never separate anything.
    fn boundaries(&self) -> Vec<usize> {
        (0..self.values.len().saturating_sub(1))
            .filter(|&k| match (single_label(&self.counts[k]), single_label(&self.counts[k + 1])) {
                (Some(a), Some(b)) => a != b,
                _ => true,
            })
            .collect()
    }

    /// Threshold between `values[k]` and `values[k + 1]`, always below the upper value.
    fn midpoint(&self, k: usize) -> f64 {
        let mid = self.values[k] + (self.values[k + 1] - self.values[k]) / 2.0;
        if mid < self.values[k + 1] {
            mid
        } else {
            self.values[k]
        }
    }

    /// Candidate thresholds in ascending order.
    pub fn candidate_cuts(&self) -> Vec<f64> {
        self.boundaries().into_iter().map(|k| self.midpoint(k)).collect()
    }

    /// Cut minimizing the label cost of the two sides, or `None` when the attribute
    /// can not separate anything.
    ///
    /// * `encoder` - Prices the label content of each side.
    /// * `rng` - Draws the candidates to evaluate when there are more than `max_candidates`.
    /// * `max_candidates` - Maximum number of thresholds evaluated.
    pub fn select_best_cut_value(&self, encoder: &Encoder, rng: &mut StdRng, max_candidates: usize) -> Option<f64> {
        if self.values.len() < 2 {
            return None;
        }
        let mut boundaries = self.boundaries();
        if boundaries.len() > max_candidates {
            boundaries = boundaries.choose_multiple(rng, max_candidates).copied().collect();
            boundaries.sort_unstable();
        }

        let n_classes = self.counts[0].len();
        let mut total = vec![0; n_classes];
        for c in &self.counts {
            total.iter_mut().zip(c).for_each(|(t, v)| *t += v);
        }

        let mut low = vec![0; n_classes];
        let mut high = vec![0; n_classes];
        let mut consumed = 0;
        let mut best: Option<(f64, f64)> = None;
        for k in boundaries {
            while consumed <= k {
                low.iter_mut()
                    .zip(&self.counts[consumed])
                    .for_each(|(l, v)| *l += v);
                consumed += 1;
            }
            high.iter_mut()
                .zip(total.iter().zip(&low))
                .for_each(|(h, (t, l))| *h = t - l);
            let cost = encoder.category_length(&low) + encoder.category_length(&high);
            if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                best = Some((cost, self.midpoint(k)));
            }
        }
        best.map(|(_, cut)| cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnSpec, Table};
    use rand::SeedableRng;

    fn dataset(values: Vec<f64>, labels: Vec<u32>) -> Dataset {
        let specs = vec![
            ColumnSpec::numeric("x"),
            ColumnSpec::categorical("label", ["a", "b"]),
        ];
        let columns = vec![Column::Numeric(values), Column::Categorical(labels)];
        Dataset::new(Table::new(specs, columns, "label").unwrap())
    }

    #[test]
    fn test_single_boundary() {
        let data = dataset(vec![3., 1., 4., 2.], vec![1, 0, 1, 0]);
        let split = ContinuousSplit::new(&data, 0);
        assert_eq!(split.unique_values(), 4);
        assert_eq!(split.candidate_cuts(), vec![2.5]);
        let encoder = Encoder::new(0.5, 2);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(split.select_best_cut_value(&encoder, &mut rng, 500), Some(2.5));
        assert_eq!(split.cut_bits(), 3f64.log2());
    }

    #[test]
    fn test_adjacent_floats_keep_the_cut_between_them() {
        let lo = 1.0 + f64::EPSILON;
        let hi = 1.0 + 2.0 * f64::EPSILON;
        let data = dataset(vec![lo, hi, lo, hi], vec![0, 1, 0, 1]);
        let split = ContinuousSplit::new(&data, 0);
        assert_eq!(split.candidate_cuts(), vec![lo]);
        let (low, high) = data.partition_numeric(0, lo);
        assert_eq!(low.label_counts(), vec![2, 0]);
        assert_eq!(high.label_counts(), vec![0, 2]);
    }

    #[test]
    fn test_mixed_values_are_boundaries() {
        let data = dataset(vec![1., 1., 2., 3.], vec![0, 1, 0, 0]);
        let split = ContinuousSplit::new(&data, 0);
        assert_eq!(split.unique_values(), 3);
        assert_eq!(split.candidate_cuts(), vec![1.5]);
    }

    #[test]
    fn test_picks_cheapest_cut() {
        let data = dataset(
            vec![1., 2., 3., 4., 5., 6., 7., 8.],
            vec![0, 0, 0, 0, 1, 1, 1, 0],
        );
        let split = ContinuousSplit::new(&data, 0);
        assert_eq!(split.candidate_cuts(), vec![4.5, 7.5]);
        let encoder = Encoder::new(0.5, 2);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(split.select_best_cut_value(&encoder, &mut rng, 500), Some(4.5));
    }

    #[test]
    fn test_not_splittable() {
        let encoder = Encoder::new(0.5, 2);
        let mut rng = StdRng::seed_from_u64(0);
        let data = dataset(vec![2., 2., 2.], vec![0, 1, 0]);
        let split = ContinuousSplit::new(&data, 0);
        assert_eq!(split.unique_values(), 1);
        assert_eq!(split.cut_bits(), 0.0);
        assert_eq!(split.select_best_cut_value(&encoder, &mut rng, 500), None);

        let data = dataset(vec![1., 2., 3.], vec![0, 0, 0]);
        let split = ContinuousSplit::new(&data, 0);
        assert!(split.candidate_cuts().is_empty());
        assert_eq!(split.select_best_cut_value(&encoder, &mut rng, 500), None);
    }

    #[test]
    fn test_subsampled_candidates_are_seeded() {
        let values: Vec<f64> = (0..1200).map(|v| v as f64).collect();
        let labels: Vec<u32> = (0..1200).map(|v| (v % 2) as u32).collect();
        let data = dataset(values, labels);
        let split = ContinuousSplit::new(&data, 0);
        assert_eq!(split.candidate_cuts().len(), 1199);
        let encoder = Encoder::new(0.5, 2);
        let first = split.select_best_cut_value(&encoder, &mut StdRng::seed_from_u64(7), 500);
        let second = split.select_best_cut_value(&encoder, &mut StdRng::seed_from_u64(7), 500);
        assert_eq!(first, second);
        let cut = first.unwrap();
        assert!(split.candidate_cuts().contains(&cut));
    }
}
