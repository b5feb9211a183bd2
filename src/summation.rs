// Compensated running sums and weighted averages

/// Running sum with compensated (Kahan) summation
///
/// The rounding error of every addition is carried in a separate term and
/// re-injected on the next addition, so the total error stays bounded
/// independently of the number of terms.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningCompensatedSummation {
    value: f64,
    err: f64,
}

impl RunningCompensatedSummation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the sum.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Overwrite the sum.  The error estimate is left as is.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Accumulate a new term and update the error estimate.
    pub fn add(&mut self, x: f64) -> &mut Self {
        let t = self.value;

        self.err += x;
        self.value = t + self.err;
        self.err += t - self.value;

        self
    }

    /// Accumulate the value of another sum.  The error of `other` is
    /// discarded.
    pub fn add_sum(&mut self, other: &Self) -> &mut Self {
        self.add(other.value)
    }

    /// Multiply the sum value by `alpha`.  The error estimate is not scaled.
    pub fn scale(&mut self, alpha: f64) -> &mut Self {
        self.value *= alpha;
        self
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Weighted running average built on two compensated sums
///
/// $$\bar{x} = \frac{\sum_i w_i x_i}{\sum_i w_i}$$
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeightedRunningAverage {
    sum: RunningCompensatedSummation,
    weight: RunningCompensatedSummation,
}

impl WeightedRunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero out both the weighted sum and the total weight.
    pub fn clear(&mut self) {
        self.sum.clear();
        self.weight.clear();
    }

    /// Accumulate the sample `x` with weight `w`.
    ///
    /// # Arguments
    /// * x: sample value
    /// * w: weight of `x` in the current sum
    pub fn add(&mut self, x: f64, w: f64) -> &mut Self {
        self.sum.add(w * x);
        self.weight.add(w);
        self
    }

    /// Accumulate the current value of `other` as a single sample of weight
    /// `w`.
    pub fn add_average(&mut self, other: &Self, w: f64) -> &mut Self {
        self.add(other.value(), w)
    }

    /// Pool the underlying sums of `other` into this average.
    pub fn combine(&mut self, other: &Self) -> &mut Self {
        self.sum.add_sum(&other.sum);
        self.weight.add_sum(&other.weight);
        self
    }

    /// Multiply the weighted sum by `alpha`, leaving the weight untouched.
    pub fn scale(&mut self, alpha: f64) -> &mut Self {
        self.sum.scale(alpha);
        self
    }

    pub fn sum(&self) -> f64 {
        self.sum.value()
    }

    pub fn weight(&self) -> f64 {
        self.weight.value()
    }

    pub fn set_sum(&mut self, sum: f64) {
        self.sum.set_value(sum);
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight.set_value(weight);
    }

    /// Value of the average, or zero if no weight has been accumulated.
    pub fn value(&self) -> f64 {
        let w = self.weight();
        if w.abs() > 0.0 {
            self.sum() / w
        } else {
            0.0
        }
    }
}

/// Zero out every average in a collection.
pub fn clear_all(averages: &mut [WeightedRunningAverage]) {
    for avg in averages.iter_mut() {
        avg.clear();
    }
}
