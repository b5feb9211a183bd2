// Cartesian grid index mapping

/// Mapping between Cartesian `(I,J,K)` triples and linearised global cell
/// IDs.
pub trait CellIndexMap {
    /// Number of cells in each of the I, J and K directions.
    fn dims(&self) -> [usize; 3];

    /// Global cell ID of cell `(i,j,k)`.
    ///
    /// Implementations must return `None` if the cell is inactive.  Indices
    /// outside of [`CellIndexMap::dims`] never reach this function.
    fn global_index(&self, i: usize, j: usize, k: usize) -> Option<usize>;

    /// Cartesian `(I,J,K)` triple of global cell `global`.
    fn ijk(&self, global: usize) -> [usize; 3];

    /// Global cell ID of the cell at `ijk + offset`, or `None` if that cell
    /// lies outside the grid or is inactive.
    fn offset_index(&self, ijk: [usize; 3], offset: [isize; 3]) -> Option<usize> {
        let dims = self.dims();
        let mut target = [0usize; 3];
        for d in 0..3 {
            let ix = ijk[d] as isize + offset[d];
            if ix < 0 || ix as usize >= dims[d] {
                return None;
            }
            target[d] = ix as usize;
        }
        self.global_index(target[0], target[1], target[2])
    }
}

/// Regular `NX * NY * NZ` grid with natural ordering (I fastest, K slowest)
/// and an optional activity mask.
#[derive(Clone, Debug, PartialEq)]
pub struct GridDims {
    nx: usize,
    ny: usize,
    nz: usize,
    actnum: Option<Vec<bool>>,
}

impl GridDims {
    /// All cells active.
    ///
    /// # Panics
    /// If any dimension is zero.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        assert!(
            nx > 0 && ny > 0 && nz > 0,
            "grid dimensions must be positive, got ({}, {}, {})",
            nx,
            ny,
            nz
        );
        Self {
            nx,
            ny,
            nz,
            actnum: None,
        }
    }

    /// Grid with an activity flag per Cartesian cell.  Missing trailing
    /// flags count as inactive.
    ///
    /// # Panics
    /// If any dimension is zero.
    pub fn with_actnum(nx: usize, ny: usize, nz: usize, actnum: Vec<bool>) -> Self {
        Self {
            actnum: Some(actnum),
            ..Self::new(nx, ny, nz)
        }
    }

    pub fn cartesian_size(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Linear index of `(i,j,k)` without any activity check.
    pub fn cartesian_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.nx * (j + self.ny * k)
    }

    pub fn is_active(&self, global: usize) -> bool {
        match &self.actnum {
            Some(act) => act.get(global).copied().unwrap_or(false),
            None => global < self.cartesian_size(),
        }
    }
}

impl CellIndexMap for GridDims {
    fn dims(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    fn global_index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        if i >= self.nx || j >= self.ny || k >= self.nz {
            return None;
        }
        let global = self.cartesian_index(i, j, k);
        if self.is_active(global) {
            Some(global)
        } else {
            None
        }
    }

    fn ijk(&self, global: usize) -> [usize; 3] {
        let i = global % self.nx;
        let j = (global / self.nx) % self.ny;
        let k = global / (self.nx * self.ny);
        [i, j, k]
    }
}
