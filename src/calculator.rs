// Well block-average pressure calculator

use ndarray::ArrayView1;

use crate::accumulator::{linear_combination, Accumulator, LocalRunningAverages, PAvgResult};
use crate::connection::Connection;
use crate::controls::PAvgControls;
use crate::error::PAvgError;
use crate::grid::CellIndexMap;
use crate::offset::connection_pressure_offset;
use crate::source::{SourceItem, Sources};
use crate::topology::{ConnectionSelection, NeighbourKind, WbpTopology};

/// Reduction of local partial sums across cooperating processes
///
/// Called once for the CTF-weighted and once for the pore-volume weighted
/// accumulator, after local contributions are complete and before final
/// results are formed.  A distributed implementation replaces `partial`
/// with the element-wise sum over all processes.
pub trait GlobalCollection {
    fn reduce(&self, partial: &mut LocalRunningAverages);
}

/// Single process.  Local sums are already global.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialCollection;

impl GlobalCollection for SerialCollection {
    fn reduce(&self, _partial: &mut LocalRunningAverages) {}
}

/// Per-cell weight within a connection's neighbourhood.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellWeighting {
    /// F1 < 0: weight by pore volume, pool terms directly
    PoreVolume,
    /// F1 >= 0: unit weight, blend terms with F1
    Unit,
}

impl CellWeighting {
    fn from_inner_weight(inner_weight: f64) -> Self {
        if inner_weight < 0.0 {
            CellWeighting::PoreVolume
        } else {
            CellWeighting::Unit
        }
    }

    fn weight(self, pore_vol: f64) -> f64 {
        match self {
            CellWeighting::PoreVolume => pore_vol,
            CellWeighting::Unit => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Term {
    Centre,
    Rectangular,
    Diagonal,
}

impl From<NeighbourKind> for Term {
    fn from(kind: NeighbourKind) -> Self {
        match kind {
            NeighbourKind::Rectangular => Term::Rectangular,
            NeighbourKind::Diagonal => Term::Diagonal,
        }
    }
}

fn add_term(acc: &mut Accumulator, term: Term, weight: f64, press: f64) {
    match term {
        Term::Centre => acc.add_centre(weight, press),
        Term::Rectangular => acc.add_rectangular(weight, press),
        Term::Diagonal => acc.add_diagonal(weight, press),
    };
}

/// Block-average pressure calculator for a single well
///
/// Topology is fixed at construction.  Each call to
/// [`PAvgCalculator::infer_block_average_pressures`] recomputes the WBP
/// values from fresh source data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PAvgCalculator {
    topology: WbpTopology,
    accum_ctf: Accumulator,
    accum_pv: Accumulator,
    average_pressures: PAvgResult,
}

impl PAvgCalculator {
    pub fn new<G: CellIndexMap + ?Sized>(cell_index_map: &G, connections: &[Connection]) -> Self {
        Self {
            topology: WbpTopology::build(cell_index_map, connections),
            ..Self::default()
        }
    }

    /// Global IDs of every cell contributing to this well's WBP values.
    pub fn all_wbp_cells(&self) -> &[usize] {
        &self.topology.contributing_cells
    }

    /// Indices of all of this well's connections.
    pub fn all_well_connections(&self) -> Vec<usize> {
        (0..self.topology.connections.len()).collect()
    }

    /// Indices of the open connections.
    pub fn open_connections(&self) -> &[usize] {
        &self.topology.open_conns
    }

    pub fn topology(&self) -> &WbpTopology {
        &self.topology
    }

    /// Most recently inferred block-average pressures.
    pub fn average_pressures(&self) -> &PAvgResult {
        &self.average_pressures
    }

    /// Remove inactive cells from the set of contributing cells.
    ///
    /// `is_active` is aligned with [`PAvgCalculator::all_wbp_cells`].
    pub fn prune_inactive_wbp_cells(&mut self, is_active: &[bool]) -> Result<(), PAvgError> {
        self.topology.prune_inactive_cells(is_active)
    }

    /// Infer block-average pressures on a single process.
    ///
    /// # Arguments
    /// * sources: block and connection source data for this well
    /// * controls: WPAVE controls
    /// * gravity: strength of gravity acceleration in m/s^2
    /// * ref_depth: well's reference depth in m
    pub fn infer_block_average_pressures(
        &mut self,
        sources: &Sources,
        controls: &PAvgControls,
        gravity: f64,
        ref_depth: f64,
    ) -> Result<&PAvgResult, PAvgError> {
        self.infer_block_average_pressures_with(
            sources,
            controls,
            gravity,
            ref_depth,
            &SerialCollection,
        )
    }

    /// Infer block-average pressures, reducing partial sums through
    /// `collection` before forming the final values.
    pub fn infer_block_average_pressures_with<C: GlobalCollection + ?Sized>(
        &mut self,
        sources: &Sources,
        controls: &PAvgControls,
        gravity: f64,
        ref_depth: f64,
        collection: &C,
    ) -> Result<&PAvgResult, PAvgError> {
        self.accumulate_local_contributions(sources, controls, gravity, ref_depth)?;
        self.collect_global_contributions(collection);
        self.assign_results(controls);
        Ok(&self.average_pressures)
    }

    fn accumulate_local_contributions(
        &mut self,
        sources: &Sources,
        controls: &PAvgControls,
        gravity: f64,
        ref_depth: f64,
    ) -> Result<(), PAvgError> {
        self.accum_ctf.prepare_accumulation();
        self.accum_pv.prepare_accumulation();

        let conn_dp =
            connection_pressure_offset(&self.topology, sources, controls, gravity, ref_depth)?;

        let weighting = CellWeighting::from_inner_weight(controls.inner_weight);
        log::debug!(
            "Inferring WBP: {:?} cell weighting, depth correction {}, {} connections",
            weighting,
            controls.depth_correction,
            conn_dp.len()
        );

        let selection = self.topology.selection(controls.open_connections);
        Self::accumulate(
            &self.topology,
            selection,
            sources,
            controls.inner_weight,
            weighting,
            conn_dp.view(),
            &mut self.accum_ctf,
            &mut self.accum_pv,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn accumulate(
        topology: &WbpTopology,
        selection: ConnectionSelection<'_>,
        sources: &Sources,
        inner_weight: f64,
        weighting: CellWeighting,
        conn_dp: ArrayView1<'_, f64>,
        accum_ctf: &mut Accumulator,
        accum_pv: &mut Accumulator,
    ) -> Result<(), PAvgError> {
        accum_ctf.prepare_contribution();
        accum_pv.prepare_contribution();

        // Per-connection results of the CTF-weighted sum
        let mut accum_ctf_c = Accumulator::new();

        for (slot, conn_ix) in selection.iter().enumerate() {
            accum_ctf_c.prepare_accumulation();
            accum_ctf_c.prepare_contribution();

            let conn = &topology.connections[conn_ix];
            let dp = conn_dp[slot];

            let cells = std::iter::once((Term::Centre, conn.cell)).chain(
                NeighbourKind::ALL.iter().flat_map(move |&kind| {
                    conn.neighbours(kind)
                        .iter()
                        .map(move |&cell| (Term::from(kind), cell))
                }),
            );

            for (term, cell) in cells {
                let src = sources.well_blocks.get(topology.contributing_cells[cell])?;
                let press = src[SourceItem::Pressure] + dp;
                let pore_vol = src[SourceItem::PoreVol];

                add_term(&mut accum_ctf_c, term, weighting.weight(pore_vol), press);
                add_term(accum_pv, term, pore_vol, press);
            }

            accum_ctf_c.commit_contribution(inner_weight);
            accum_ctf.add(conn.ctf, &accum_ctf_c);
        }

        // Pore-volume weighted terms span every connection and are pooled
        // without F1 weighting.
        accum_pv.commit_contribution(-1.0);

        Ok(())
    }

    fn collect_global_contributions<C: GlobalCollection + ?Sized>(&mut self, collection: &C) {
        for accum in [&mut self.accum_ctf, &mut self.accum_pv].iter_mut() {
            let mut partial = accum.running_averages();
            collection.reduce(&mut partial);
            accum.assign_running_averages(&partial);
        }
    }

    fn assign_results(&mut self, controls: &PAvgControls) {
        let f2 = controls.conn_weight;
        self.average_pressures = linear_combination(
            f2,
            self.accum_ctf.final_result(),
            1.0 - f2,
            &self.accum_pv.final_result(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::WbpMode;
    use crate::connection::{ConnectionState, Direction};
    use crate::controls::DepthCorrection;
    use crate::grid::GridDims;
    use crate::source::PAvgDynamicSourceData;
    use approx::assert_relative_eq;

    /// One vertical connection in cell 0 of a 2x1x1 grid, cell 1 is its
    /// only (rectangular) neighbour.
    fn single_connection(ctf: f64) -> (PAvgCalculator, Sources) {
        let grid = GridDims::new(2, 1, 1);
        let conn = Connection::new(0, ConnectionState::Open, ctf, 0.0, Direction::Z);
        let calc = PAvgCalculator::new(&grid, &[conn]);

        let mut blocks = PAvgDynamicSourceData::new(calc.all_wbp_cells());
        blocks
            .get_mut(0)
            .unwrap()
            .set(SourceItem::Pressure, 100.0)
            .set(SourceItem::PoreVol, 10.0);
        blocks
            .get_mut(1)
            .unwrap()
            .set(SourceItem::Pressure, 90.0)
            .set(SourceItem::PoreVol, 5.0);
        let conns = PAvgDynamicSourceData::new(&calc.all_well_connections());

        (calc, Sources::new(blocks, conns))
    }

    #[test]
    fn ctf_weighted_single_connection() {
        let (mut calc, sources) = single_connection(2.0);
        let controls = PAvgControls::new(0.5, 1.0, DepthCorrection::Well, true);

        let r = *calc
            .infer_block_average_pressures(&sources, &controls, 0.0, 0.0)
            .unwrap();

        assert_relative_eq!(r.value(WbpMode::Wbp), 100.0);
        assert_relative_eq!(r.value(WbpMode::Wbp4), 90.0);
        assert_relative_eq!(r.value(WbpMode::Wbp5), 95.0);
        assert_relative_eq!(r.value(WbpMode::Wbp9), 95.0);
        assert_eq!(calc.average_pressures(), &r);
    }

    #[test]
    fn pore_volume_weighted_blend() {
        let (mut calc, sources) = single_connection(2.0);
        let controls = PAvgControls::new(0.5, 0.0, DepthCorrection::None, true);

        let r = *calc
            .infer_block_average_pressures(&sources, &controls, 9.81, 0.0)
            .unwrap();

        // (10*100 + 5*90) / 15
        let pooled = 1450.0 / 15.0;
        assert_relative_eq!(r.value(WbpMode::Wbp), 100.0);
        assert_relative_eq!(r.value(WbpMode::Wbp4), 90.0);
        assert_relative_eq!(r.value(WbpMode::Wbp5), pooled);
        assert_relative_eq!(r.value(WbpMode::Wbp9), pooled);
    }

    #[test]
    fn negative_inner_weight_uses_pore_volume_within_connection() {
        let (mut calc, sources) = single_connection(2.0);
        let controls = PAvgControls::new(-1.0, 1.0, DepthCorrection::None, true);

        let r = *calc
            .infer_block_average_pressures(&sources, &controls, 0.0, 0.0)
            .unwrap();

        assert_relative_eq!(r.value(WbpMode::Wbp5), 1450.0 / 15.0);
    }

    #[test]
    fn reinference_starts_from_scratch() {
        let (mut calc, sources) = single_connection(2.0);
        let controls = PAvgControls::default();

        let first = *calc
            .infer_block_average_pressures(&sources, &controls, 0.0, 0.0)
            .unwrap();
        let second = *calc
            .infer_block_average_pressures(&sources, &controls, 0.0, 0.0)
            .unwrap();
        assert_eq!(first, second);
    }

    /// Doubles every partial sum, like summing two identical processes.
    struct TwoIdenticalRanks;

    impl GlobalCollection for TwoIdenticalRanks {
        fn reduce(&self, partial: &mut LocalRunningAverages) {
            partial.iter_mut().for_each(|x| *x *= 2.0);
        }
    }

    #[test]
    fn global_collection_sees_partial_sums() {
        let (mut calc, sources) = single_connection(2.0);
        let controls = PAvgControls::new(0.5, 0.5, DepthCorrection::None, true);

        let serial = *calc
            .infer_block_average_pressures(&sources, &controls, 0.0, 0.0)
            .unwrap();
        let doubled = *calc
            .infer_block_average_pressures_with(&sources, &controls, 0.0, 0.0, &TwoIdenticalRanks)
            .unwrap();

        for mode in WbpMode::ALL.iter() {
            assert_relative_eq!(serial.value(*mode), doubled.value(*mode), max_relative = 1e-12);
        }
    }

    #[test]
    fn unsupported_depth_correction_aborts_inference() {
        let (mut calc, sources) = single_connection(2.0);
        let controls = PAvgControls::new(0.5, 1.0, DepthCorrection::Unsupported("4".into()), true);

        assert!(matches!(
            calc.infer_block_average_pressures(&sources, &controls, 9.81, 0.0),
            Err(PAvgError::UnsupportedDepthCorrection(_))
        ));
    }

    #[test]
    fn missing_block_source_is_reported() {
        let (mut calc, _) = single_connection(1.0);
        let sources = Sources::new(
            PAvgDynamicSourceData::new(&[0]),
            PAvgDynamicSourceData::new(&[0]),
        );
        let controls = PAvgControls::new(0.5, 1.0, DepthCorrection::None, false);

        assert!(matches!(
            calc.infer_block_average_pressures(&sources, &controls, 0.0, 0.0),
            Err(PAvgError::UnknownSourceLocation(1))
        ));
    }
}
