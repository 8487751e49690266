use serde::Serialize;

/// Sample mean and standard deviation of a per-vertex tally.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub mean: f64,
    pub std_dev: f64,
}

/// Two-pass statistics with the rounding-error compensation term
/// `(Σ(x−μ))² / n`. The deviation uses the `n − 1` divisor and is 0 below two samples.
pub fn distribution(values: &[u64]) -> Distribution {
    let n = values.len();
    if n == 0 {
        return Distribution { mean: 0.0, std_dev: 0.0 };
    }
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    if n < 2 {
        return Distribution { mean, std_dev: 0.0 };
    }
    let (sum_sq, sum_dev) = values.iter().fold((0.0, 0.0), |(sq, dev), &v| {
        let d = v as f64 - mean;
        (sq + d * d, dev + d)
    });
    let var = (sum_sq - sum_dev * sum_dev / n as f64) / (n - 1) as f64;
    Distribution { mean, std_dev: var.max(0.0).sqrt() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_values() {
        let d = distribution(&[4, 4, 4, 4]);
        assert_eq!(d.mean, 4.0);
        assert_eq!(d.std_dev, 0.0);
    }

    #[test]
    fn test_sample_deviation() {
        // mean 5, squared deviations sum to 32, n − 1 = 7
        let d = distribution(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(d.mean, 5.0);
        assert!((d.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_lengths() {
        assert_eq!(distribution(&[]), Distribution { mean: 0.0, std_dev: 0.0 });
        assert_eq!(distribution(&[6]), Distribution { mean: 6.0, std_dev: 0.0 });
    }
}
