// Accumulation of block-average pressure terms into WBP results

use crate::summation::{clear_all, WeightedRunningAverage};

/// Kind of block-average pressure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WbpMode {
    /// Connecting cell only
    Wbp = 0,
    /// Rectangular neighbours only
    Wbp4 = 1,
    /// Connecting cell and rectangular neighbours
    Wbp5 = 2,
    /// Connecting cell, rectangular and diagonal neighbours
    Wbp9 = 3,
}

impl WbpMode {
    pub const ALL: [WbpMode; 4] = [WbpMode::Wbp, WbpMode::Wbp4, WbpMode::Wbp5, WbpMode::Wbp9];

    pub fn name(self) -> &'static str {
        match self {
            WbpMode::Wbp => "WBP",
            WbpMode::Wbp4 => "WBP4",
            WbpMode::Wbp5 => "WBP5",
            WbpMode::Wbp9 => "WBP9",
        }
    }
}

/// The four block-average pressures of a well.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PAvgResult {
    wbp: [f64; 4],
}

impl PAvgResult {
    pub fn value(&self, mode: WbpMode) -> f64 {
        self.wbp[mode as usize]
    }

    pub fn set(&mut self, mode: WbpMode, value: f64) -> &mut Self {
        self.wbp[mode as usize] = value;
        self
    }
}

/// Linear combination `alpha*x + beta*y` of two results, element by element.
pub fn linear_combination(alpha: f64, x: PAvgResult, beta: f64, y: &PAvgResult) -> PAvgResult {
    let mut out = x;
    for (xi, yi) in out.wbp.iter_mut().zip(y.wbp.iter()) {
        *xi = alpha * *xi + beta * *yi;
    }
    out
}

/// Serialised partial sums of an [`Accumulator`]: (sum, weight) pairs in
/// WBP, WBP4, WBP5, WBP9 order.
pub type LocalRunningAverages = [f64; 8];

const CENTRE: usize = 0;
const RECTANGULAR: usize = 1;
const DIAGONAL: usize = 2;

/// Running WBP accumulator
///
/// Holds three transient term averages (centre, rectangular, diagonal) for
/// the connection currently being processed, and four result averages
/// (WBP, WBP4, WBP5, WBP9) that persist across connections.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Accumulator {
    avg: [WeightedRunningAverage; 4],
    term: [WeightedRunningAverage; 3],
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add contribution from the connecting cell.
    pub fn add_centre(&mut self, weight: f64, press: f64) -> &mut Self {
        self.term[CENTRE].add(press, weight);
        self
    }

    /// Add contribution from a face-adjacent neighbour.
    pub fn add_rectangular(&mut self, weight: f64, press: f64) -> &mut Self {
        self.term[RECTANGULAR].add(press, weight);
        self
    }

    /// Add contribution from an edge-adjacent neighbour.
    pub fn add_diagonal(&mut self, weight: f64, press: f64) -> &mut Self {
        self.term[DIAGONAL].add(press, weight);
        self
    }

    /// Fold the results of `other` into this accumulator, each result value
    /// weighted by `weight`.
    ///
    /// Typically adds one connection's results to the sum over all
    /// connections.
    pub fn add(&mut self, weight: f64, other: &Accumulator) -> &mut Self {
        for (avg, other_avg) in self.avg.iter_mut().zip(other.avg.iter()) {
            avg.add_average(other_avg, weight);
        }
        self
    }

    /// Zero out the result averages.
    pub fn prepare_accumulation(&mut self) {
        clear_all(&mut self.avg);
    }

    /// Zero out the term averages.
    pub fn prepare_contribution(&mut self) {
        clear_all(&mut self.term);
    }

    /// Fold the current terms into the results.
    ///
    /// # Arguments
    /// * inner_weight: weight of the connecting cell term (F1).  Neighbour
    ///   terms get `1 - inner_weight`.  A negative value pools the terms
    ///   directly without weighting.
    pub fn commit_contribution(&mut self, inner_weight: f64) {
        self.avg[WbpMode::Wbp as usize].combine(&self.term[CENTRE]);
        self.avg[WbpMode::Wbp4 as usize].combine(&self.term[RECTANGULAR]);

        if inner_weight < 0.0 {
            self.combine_direct();
        } else {
            self.combine_weighted(inner_weight);
        }
    }

    fn combine_direct(&mut self) {
        let [centre, rect, diag] = self.term;

        self.avg[WbpMode::Wbp5 as usize]
            .combine(&centre)
            .combine(&rect);

        self.avg[WbpMode::Wbp9 as usize]
            .combine(&centre)
            .combine(&rect)
            .combine(&diag);
    }

    fn combine_weighted(&mut self, inner_weight: f64) {
        let [centre, rect, diag] = self.term;

        // WBP5 = w*Centre + (1-w)*Rectangular
        self.avg[WbpMode::Wbp5 as usize]
            .add_average(&centre, inner_weight)
            .add_average(&rect, 1.0 - inner_weight);

        // WBP9 = w*Centre + (1-w)*(Rectangular + Diagonal)
        let mut outer = rect;
        outer.combine(&diag);
        self.avg[WbpMode::Wbp9 as usize]
            .add_average(&centre, inner_weight)
            .add_average(&outer, 1.0 - inner_weight);
    }

    /// Local partial sums, for reduction across cooperating processes.
    pub fn running_averages(&self) -> LocalRunningAverages {
        let mut a = [0.0; 8];
        for (pair, avg) in a.chunks_exact_mut(2).zip(self.avg.iter()) {
            pair[0] = avg.sum();
            pair[1] = avg.weight();
        }
        a
    }

    /// Replace the result sums with reduced, global values.
    pub fn assign_running_averages(&mut self, a: &LocalRunningAverages) {
        for (pair, avg) in a.chunks_exact(2).zip(self.avg.iter_mut()) {
            avg.set_sum(pair[0]);
            avg.set_weight(pair[1]);
        }
    }

    pub fn final_result(&self) -> PAvgResult {
        let mut result = PAvgResult::default();
        for mode in WbpMode::ALL.iter() {
            result.set(*mode, self.avg[*mode as usize].value());
        }
        result
    }
}
