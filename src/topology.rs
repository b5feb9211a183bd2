// Connection neighbourhood topology for block-average pressures

use std::collections::HashMap;

use crate::connection::{Connection, Direction};
use crate::error::PAvgError;
use crate::grid::CellIndexMap;

/// Rectangular or diagonal neighbour of a connecting cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NeighbourKind {
    Rectangular,
    Diagonal,
}

impl NeighbourKind {
    pub const ALL: [NeighbourKind; 2] = [NeighbourKind::Rectangular, NeighbourKind::Diagonal];
}

/// `(I,J,K)` offsets of the rectangular and diagonal neighbours in the plane
/// orthogonal to `dir`.
fn neighbour_offsets(dir: Direction) -> ([[isize; 3]; 4], [[isize; 3]; 4]) {
    match dir {
        Direction::X => (
            [[0, 0, 1], [0, 0, -1], [0, 1, 0], [0, -1, 0]],
            [[0, 1, 1], [0, 1, -1], [0, -1, 1], [0, -1, -1]],
        ),
        Direction::Y => (
            [[1, 0, 0], [-1, 0, 0], [0, 0, 1], [0, 0, -1]],
            [[1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1]],
        ),
        Direction::Z => (
            [[1, 0, 0], [-1, 0, 0], [0, 1, 0], [0, -1, 0]],
            [[1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0]],
        ),
    }
}

/// Connections processed by one inference pass.
///
/// Maps a processing slot `0..len()` to an index into
/// [`WbpTopology::connections`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionSelection<'a> {
    All(usize),
    Open(&'a [usize]),
}

impl<'a> ConnectionSelection<'a> {
    pub fn len(&self) -> usize {
        match self {
            ConnectionSelection::All(n) => *n,
            ConnectionSelection::Open(ix) => ix.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn conn_index(&self, slot: usize) -> usize {
        match self {
            ConnectionSelection::All(_) => slot,
            ConnectionSelection::Open(ix) => ix[slot],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + 'a {
        let sel = *self;
        (0..sel.len()).map(move |slot| sel.conn_index(slot))
    }
}

/// A connection's view of the contributing cells.  All cell references are
/// local indices into [`WbpTopology::contributing_cells`].
#[derive(Clone, Debug, PartialEq)]
pub struct PAvgConnection {
    pub ctf: f64,
    pub depth: f64,
    pub cell: usize,
    pub rect_neighbours: Vec<usize>,
    pub diag_neighbours: Vec<usize>,
}

impl PAvgConnection {
    fn new(ctf: f64, depth: f64, cell: usize) -> Self {
        Self {
            ctf,
            depth,
            cell,
            rect_neighbours: Vec::new(),
            diag_neighbours: Vec::new(),
        }
    }

    pub fn neighbours(&self, kind: NeighbourKind) -> &[usize] {
        match kind {
            NeighbourKind::Rectangular => &self.rect_neighbours,
            NeighbourKind::Diagonal => &self.diag_neighbours,
        }
    }

    fn neighbours_mut(&mut self, kind: NeighbourKind) -> &mut Vec<usize> {
        match kind {
            NeighbourKind::Rectangular => &mut self.rect_neighbours,
            NeighbourKind::Diagonal => &mut self.diag_neighbours,
        }
    }

    /// Connecting cell followed by all rectangular and diagonal neighbours.
    pub fn all_cells(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.cell)
            .chain(self.rect_neighbours.iter().copied())
            .chain(self.diag_neighbours.iter().copied())
    }
}

/// Contributing cells and per-connection neighbourhoods of a single well.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WbpTopology {
    /// Global cell IDs, in order of first appearance
    pub contributing_cells: Vec<usize>,
    pub connections: Vec<PAvgConnection>,
    /// Indices into `connections` of the open connections
    pub open_conns: Vec<usize>,
}

impl WbpTopology {
    /// Build topology of `connections` on the grid `cell_index_map`.
    pub fn build<G: CellIndexMap + ?Sized>(cell_index_map: &G, connections: &[Connection]) -> Self {
        let mut builder = TopologyBuilder {
            topology: WbpTopology {
                contributing_cells: Vec::new(),
                connections: Vec::with_capacity(connections.len()),
                open_conns: Vec::with_capacity(connections.len()),
            },
            local_index: HashMap::new(),
        };

        for conn in connections {
            builder.add_connection(cell_index_map, conn);
        }

        let topology = builder.topology;
        log::debug!(
            "WBP topology: {} contributing cells, {} connections ({} open)",
            topology.contributing_cells.len(),
            topology.connections.len(),
            topology.open_conns.len()
        );
        topology
    }

    /// Every connection, or the open ones only.
    pub fn selection(&self, open_only: bool) -> ConnectionSelection<'_> {
        if open_only {
            ConnectionSelection::Open(&self.open_conns)
        } else {
            ConnectionSelection::All(self.connections.len())
        }
    }

    /// Drop inactive cells and renumber the local cell indices.
    ///
    /// `is_active` is aligned with `contributing_cells`.  Neighbours that
    /// refer to inactive cells are removed from their connection.  A mask
    /// that deactivates a connecting cell is rejected and leaves the
    /// topology unchanged.
    pub fn prune_inactive_cells(&mut self, is_active: &[bool]) -> Result<(), PAvgError> {
        if is_active.len() != self.contributing_cells.len() {
            return Err(PAvgError::ActivityMaskSize {
                expected: self.contributing_cells.len(),
                actual: is_active.len(),
            });
        }

        if let Some((connection, conn)) = self
            .connections
            .iter()
            .enumerate()
            .find(|(_, conn)| !is_active[conn.cell])
        {
            return Err(PAvgError::InactiveConnectionCell {
                connection,
                cell: self.contributing_cells[conn.cell],
            });
        }

        let active_ix: Vec<usize> = (0..is_active.len()).filter(|&i| is_active[i]).collect();
        if active_ix.len() == is_active.len() {
            return Ok(());
        }

        self.contributing_cells = active_ix
            .iter()
            .map(|&orig| self.contributing_cells[orig])
            .collect();

        // Only read for active cells
        let mut new_index = vec![0usize; is_active.len()];
        for (new, &orig) in active_ix.iter().enumerate() {
            new_index[orig] = new;
        }

        for conn in self.connections.iter_mut() {
            conn.cell = new_index[conn.cell];
            for kind in NeighbourKind::ALL.iter() {
                let neighbours = conn.neighbours_mut(*kind);
                *neighbours = neighbours
                    .iter()
                    .filter(|&&n| is_active[n])
                    .map(|&n| new_index[n])
                    .collect();
            }
        }

        log::debug!(
            "Pruned {} inactive WBP cells, {} remain",
            is_active.len() - active_ix.len(),
            active_ix.len()
        );
        Ok(())
    }
}

struct TopologyBuilder {
    topology: WbpTopology,
    /// Global cell ID to local index.  Only needed while building.
    local_index: HashMap<usize, usize>,
}

impl TopologyBuilder {
    fn insert_cell(&mut self, global: usize) -> usize {
        let cells = &mut self.topology.contributing_cells;
        *self.local_index.entry(global).or_insert_with(|| {
            cells.push(global);
            cells.len() - 1
        })
    }

    fn add_connection<G: CellIndexMap + ?Sized>(&mut self, cell_index_map: &G, conn: &Connection) {
        let cell = self.insert_cell(conn.global_index);

        if conn.is_open() {
            self.topology.open_conns.push(self.topology.connections.len());
        }

        let mut pconn = PAvgConnection::new(conn.ctf, conn.depth, cell);

        let ijk = cell_index_map.ijk(conn.global_index);
        let (rect, diag) = neighbour_offsets(conn.dir);
        for (kind, offsets) in [(NeighbourKind::Rectangular, rect), (NeighbourKind::Diagonal, diag)].iter() {
            for offset in offsets.iter() {
                if let Some(global) = cell_index_map.offset_index(ijk, *offset) {
                    let local = self.insert_cell(global);
                    pconn.neighbours_mut(*kind).push(local);
                }
            }
        }

        self.topology.connections.push(pconn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use crate::grid::GridDims;

    fn conn(grid: &GridDims, ijk: [usize; 3], dir: Direction) -> Connection {
        let g = grid.cartesian_index(ijk[0], ijk[1], ijk[2]);
        Connection::new(g, ConnectionState::Open, 1.0, 0.0, dir)
    }

    fn globals(topo: &WbpTopology, locals: &[usize]) -> Vec<usize> {
        locals.iter().map(|&l| topo.contributing_cells[l]).collect()
    }

    #[test]
    fn interior_vertical_connection_has_eight_neighbours() {
        let grid = GridDims::new(3, 3, 3);
        let topo = WbpTopology::build(&grid, &[conn(&grid, [1, 1, 1], Direction::Z)]);

        assert_eq!(topo.contributing_cells.len(), 9);
        let c = &topo.connections[0];
        assert_eq!(c.cell, 0);
        assert_eq!(
            globals(&topo, &c.rect_neighbours),
            vec![
                grid.cartesian_index(2, 1, 1),
                grid.cartesian_index(0, 1, 1),
                grid.cartesian_index(1, 2, 1),
                grid.cartesian_index(1, 0, 1),
            ]
        );
        assert_eq!(
            globals(&topo, &c.diag_neighbours),
            vec![
                grid.cartesian_index(2, 2, 1),
                grid.cartesian_index(0, 2, 1),
                grid.cartesian_index(2, 0, 1),
                grid.cartesian_index(0, 0, 1),
            ]
        );
    }

    #[test]
    fn horizontal_connections_use_orthogonal_planes() {
        let grid = GridDims::new(3, 3, 3);
        let topo = WbpTopology::build(
            &grid,
            &[
                conn(&grid, [1, 1, 1], Direction::X),
                conn(&grid, [1, 1, 1], Direction::Y),
            ],
        );

        let x = &topo.connections[0];
        for g in globals(&topo, &x.rect_neighbours)
            .into_iter()
            .chain(globals(&topo, &x.diag_neighbours))
        {
            assert_eq!(grid.ijk(g)[0], 1);
        }

        let y = &topo.connections[1];
        for g in globals(&topo, &y.rect_neighbours)
            .into_iter()
            .chain(globals(&topo, &y.diag_neighbours))
        {
            assert_eq!(grid.ijk(g)[1], 1);
        }
        assert_eq!(
            globals(&topo, &y.rect_neighbours),
            vec![
                grid.cartesian_index(2, 1, 1),
                grid.cartesian_index(0, 1, 1),
                grid.cartesian_index(1, 1, 2),
                grid.cartesian_index(1, 1, 0),
            ]
        );
    }

    #[test]
    fn corner_connection_drops_out_of_bounds_neighbours() {
        let grid = GridDims::new(3, 3, 1);
        let topo = WbpTopology::build(&grid, &[conn(&grid, [0, 0, 0], Direction::Z)]);

        let c = &topo.connections[0];
        assert_eq!(c.rect_neighbours.len(), 2);
        assert_eq!(c.diag_neighbours.len(), 1);
        assert_eq!(topo.contributing_cells.len(), 4);
    }

    #[test]
    fn inactive_neighbours_are_dropped() {
        let mut act = vec![true; 9];
        act[1] = false; // (1,0,0)
        let grid = GridDims::with_actnum(3, 3, 1, act);
        let topo = WbpTopology::build(&grid, &[conn(&grid, [0, 0, 0], Direction::Z)]);

        let c = &topo.connections[0];
        assert_eq!(globals(&topo, &c.rect_neighbours), vec![3]);
        assert_eq!(globals(&topo, &c.diag_neighbours), vec![4]);
    }

    #[test]
    fn shared_cells_are_deduplicated_in_first_seen_order() {
        let grid = GridDims::new(4, 1, 3);
        let mut c1 = conn(&grid, [1, 0, 0], Direction::Z);
        let c2 = conn(&grid, [2, 0, 0], Direction::Z);
        c1.state = ConnectionState::Shut;
        let topo = WbpTopology::build(&grid, &[c1, c2]);

        // Cells (1,0,0), (2,0,0), (0,0,0), then (3,0,0) from the second
        assert_eq!(topo.contributing_cells, vec![1, 2, 0, 3]);
        assert_eq!(topo.connections[1].cell, 1);
        assert_eq!(topo.connections[1].rect_neighbours, vec![3, 0]);
        assert_eq!(topo.open_conns, vec![1]);
    }

    #[test]
    fn open_selection_translates_slots() {
        let grid = GridDims::new(3, 1, 1);
        let mut shut = conn(&grid, [0, 0, 0], Direction::Z);
        shut.state = ConnectionState::Shut;
        let topo = WbpTopology::build(
            &grid,
            &[shut, conn(&grid, [1, 0, 0], Direction::Z), conn(&grid, [2, 0, 0], Direction::Z)],
        );

        let open = topo.selection(true);
        assert_eq!(open.len(), 2);
        assert_eq!(open.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(topo.selection(false).iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn all_true_mask_is_a_no_op() {
        let grid = GridDims::new(3, 3, 3);
        let mut topo = WbpTopology::build(&grid, &[conn(&grid, [1, 1, 1], Direction::Z)]);
        let before = topo.clone();

        topo.prune_inactive_cells(&vec![true; 9]).unwrap();
        assert_eq!(topo, before);
    }

    #[test]
    fn pruning_renumbers_and_drops_neighbours() {
        let grid = GridDims::new(4, 1, 3);
        let topo_conns = [
            conn(&grid, [1, 0, 0], Direction::Z),
            conn(&grid, [2, 0, 0], Direction::Z),
        ];
        let mut topo = WbpTopology::build(&grid, &topo_conns);
        assert_eq!(topo.contributing_cells, vec![1, 2, 0, 3]);

        // Deactivate global cell 0, only a neighbour of the first connection
        topo.prune_inactive_cells(&[true, true, false, true]).unwrap();

        assert_eq!(topo.contributing_cells, vec![1, 2, 3]);
        assert_eq!(topo.connections[0].cell, 0);
        assert_eq!(topo.connections[0].rect_neighbours, vec![1]);
        assert_eq!(topo.connections[1].cell, 1);
        assert_eq!(topo.connections[1].rect_neighbours, vec![2, 0]);
    }

    #[test]
    fn inactive_connection_cell_is_an_error() {
        let grid = GridDims::new(3, 1, 1);
        let conns = [
            conn(&grid, [1, 0, 0], Direction::Z),
            conn(&grid, [2, 0, 0], Direction::Z),
        ];
        let mut topo = WbpTopology::build(&grid, &conns);
        assert_eq!(topo.contributing_cells, vec![1, 2, 0]);

        let before = topo.clone();
        assert!(matches!(
            topo.prune_inactive_cells(&[true, false, true]),
            Err(PAvgError::InactiveConnectionCell {
                connection: 1,
                cell: 2
            })
        ));
        assert_eq!(topo, before);
    }

    #[test]
    fn mask_size_mismatch_is_an_error() {
        let grid = GridDims::new(1, 1, 1);
        let mut topo = WbpTopology::build(&grid, &[conn(&grid, [0, 0, 0], Direction::Z)]);
        assert!(matches!(
            topo.prune_inactive_cells(&[true, false]),
            Err(PAvgError::ActivityMaskSize {
                expected: 1,
                actual: 2
            })
        ));
    }
}
