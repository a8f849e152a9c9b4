//! Utils
//!
//! Numeric helpers shared by the encoder and the search: bit costs, log-factorials,
//! subset enumeration and parameter validation.
use crate::errors::GraphError;

// Validation
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), GraphError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(GraphError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_min_parameter(value: usize, min: usize, parameter: &str) -> Result<(), GraphError> {
    if value < min {
        Err(GraphError::InvalidParameter(
            parameter.to_string(),
            format!("integer of at least {}", min),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Bits needed to announce an event of probability `p`.
/// Degenerate probabilities (exactly 0 or 1) cost nothing.
#[inline]
pub fn bits(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        0.0
    } else {
        -p.log2()
    }
}

/// log2(n!)
pub fn log2_factorial(n: usize) -> f64 {
    (2..=n).map(|k| (k as f64).log2()).sum()
}

/// log2 of the binomial coefficient C(n, k), zero when k > n.
pub fn log2_binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    log2_factorial(n) - log2_factorial(k) - log2_factorial(n - k)
}

/// Lexicographic k-subsets of `0..n`, yielded as sorted index vectors.
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Combinations {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();
        let k = self.indices.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }
        Some(current)
    }
}

pub fn precision_round(n: f64, precision: i32) -> f64 {
    let p = (10.0_f64).powi(precision);
    (n * p).round() / p
}
