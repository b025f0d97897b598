//! Descriptive statistics, quantile binning and kernel density estimates.

/// Summary of one numeric variable over its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1 denominator).
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean: mean(values),
            std: sample_std(values),
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Quantile with linear interpolation between order statistics.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), q)
}

/// Several quantiles over one sort.
pub fn quantiles(values: &[f64], qs: &[f64]) -> Vec<Option<f64>> {
    let sorted = sorted(values);
    qs.iter().map(|&q| quantile_sorted(&sorted, q)).collect()
}

/// Equal-frequency bin edges; repeated edges are dropped.
///
/// Returns fewer than `bins + 1` edges when the data has ties at the
/// boundaries, and an empty vector when no bin can be formed.
pub fn quantile_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let sorted = sorted(values);
    if sorted.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut edges: Vec<f64> = (0..=bins)
        .filter_map(|i| quantile_sorted(&sorted, i as f64 / bins as f64))
        .collect();
    edges.dedup();
    if edges.len() < 2 { Vec::new() } else { edges }
}

/// Bin of `value` among right-closed intervals; the first bin also
/// includes its left edge.
pub fn assign_bin(value: f64, edges: &[f64]) -> Option<usize> {
    if edges.len() < 2 || value.is_nan() {
        return None;
    }
    if value < edges[0] || value > edges[edges.len() - 1] {
        return None;
    }
    if value == edges[0] {
        return Some(0);
    }
    edges.windows(2).position(|w| value > w[0] && value <= w[1])
}

/// Interval label for bin `index`, e.g. `(0.125, 0.5]`.
pub fn bin_label(edges: &[f64], index: usize) -> String {
    let (lo, hi) = (edges[index], edges[index + 1]);
    if index == 0 {
        format!("[{lo:.3}, {hi:.3}]")
    } else {
        format!("({lo:.3}, {hi:.3}]")
    }
}

/// Gaussian kernel density estimate with Scott's bandwidth rule.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    data: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// `None` with fewer than two points or zero spread.
    pub fn new(values: &[f64]) -> Option<Self> {
        let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let std = sample_std(&data)?;
        if std <= 0.0 {
            return None;
        }
        let factor = (data.len() as f64).powf(-0.2);
        Some(Self {
            bandwidth: std * factor,
            data,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let norm = 1.0 / (self.data.len() as f64 * self.bandwidth * (2.0 * std::f64::consts::PI).sqrt());
        let sum: f64 = self
            .data
            .iter()
            .map(|xi| {
                let u = (x - xi) / self.bandwidth;
                (-0.5 * u * u).exp()
            })
            .sum();
        norm * sum
    }

    /// Evaluation grid covering the data plus three bandwidths each side.
    pub fn support(&self, points: usize) -> Vec<f64> {
        let lo = self.data.iter().copied().fold(f64::INFINITY, f64::min) - 3.0 * self.bandwidth;
        let hi = self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 3.0 * self.bandwidth;
        if points < 2 {
            return vec![lo];
        }
        let step = (hi - lo) / (points - 1) as f64;
        (0..points).map(|i| lo + step * i as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_sample_std() {
        let s = Summary::of(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert!((s.std.unwrap() - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert_eq!((s.min, s.max), (Some(1.0), Some(4.0)));
        assert_eq!(Summary::of(&[5.0]).std, None);
        assert_eq!(Summary::of(&[]).mean, None);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert!((quantile(&values, 0.1).unwrap() - 1.3).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn tied_edges_are_dropped() {
        let values = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 1.0];
        let edges = quantile_edges(&values, 5);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(edges.first(), Some(&0.0));
        assert_eq!(edges.last(), Some(&1.0));
        assert_eq!(assign_bin(0.0, &edges), Some(0));
        assert_eq!(assign_bin(1.0, &edges), Some(edges.len() - 2));
        assert!(quantile_edges(&[2.0, 2.0], 5).is_empty());
    }

    #[test]
    fn bins_are_right_closed() {
        let edges = [0.0, 1.0, 2.0];
        assert_eq!(assign_bin(1.0, &edges), Some(0));
        assert_eq!(assign_bin(1.5, &edges), Some(1));
        assert_eq!(assign_bin(2.5, &edges), None);
        assert_eq!(bin_label(&edges, 1), "(1.000, 2.000]");
    }

    #[test]
    fn kde_integrates_to_one() {
        let kde = GaussianKde::new(&[0.1, 0.2, 0.2, 0.4, 0.9]).unwrap();
        let grid = kde.support(2001);
        let step = grid[1] - grid[0];
        let area: f64 = grid.iter().map(|&x| kde.evaluate(x) * step).sum();
        assert!((area - 1.0).abs() < 0.01, "area {area}");
        assert!(GaussianKde::new(&[1.0, 1.0]).is_none());
    }
}
