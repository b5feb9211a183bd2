// Python bindings

use ndarray::Array1;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::accumulator::WbpMode;
use crate::calculator::PAvgCalculator;
use crate::connection::{Connection, ConnectionState, Direction};
use crate::controls::{DepthCorrection, PAvgControls};
use crate::error::PAvgError;
use crate::grid::{CellIndexMap, GridDims};
use crate::offset::pressure_offsets;
use crate::source::{PAvgDynamicSourceData, Sources};

fn to_py_err(err: PAvgError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn check_len(name: &str, actual: usize, expected: usize) -> PyResult<()> {
    if actual != expected {
        return Err(PyValueError::new_err(format!(
            "{} has {} entries, expected {}",
            name, actual, expected
        )));
    }
    Ok(())
}

/// Block-average pressure calculator for one well.
#[pyclass(name = "PAvgCalculator")]
pub struct PyPAvgCalculator {
    inner: PAvgCalculator,
}

#[pymethods]
impl PyPAvgCalculator {
    #[new]
    #[pyo3(signature = (dims, i, j, k, dirs, ctf, depth, open, actnum = None))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        dims: (usize, usize, usize),
        i: Vec<usize>,
        j: Vec<usize>,
        k: Vec<usize>,
        dirs: Vec<String>,
        ctf: PyReadonlyArray1<'_, f64>,
        depth: PyReadonlyArray1<'_, f64>,
        open: Vec<bool>,
        actnum: Option<Vec<bool>>,
    ) -> PyResult<Self> {
        let (nx, ny, nz) = dims;
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(PyValueError::new_err(format!(
                "Grid dimensions must be positive, got ({}, {}, {})",
                nx, ny, nz
            )));
        }
        let grid = match actnum {
            Some(act) => {
                check_len("actnum", act.len(), nx * ny * nz)?;
                GridDims::with_actnum(nx, ny, nz, act)
            }
            None => GridDims::new(nx, ny, nz),
        };

        let ctf = ctf.as_array();
        let depth = depth.as_array();
        let nconn = i.len();
        for (name, len) in [
            ("j", j.len()),
            ("k", k.len()),
            ("dirs", dirs.len()),
            ("ctf", ctf.len()),
            ("depth", depth.len()),
            ("open", open.len()),
        ]
        .iter()
        {
            check_len(name, *len, nconn)?;
        }

        let mut connections = Vec::with_capacity(nconn);
        for c in 0..nconn {
            let dir: Direction = dirs[c].parse().map_err(|_| {
                PyValueError::new_err(format!("Unknown connection direction '{}'", dirs[c]))
            })?;
            let state = if open[c] {
                ConnectionState::Open
            } else {
                ConnectionState::Shut
            };
            let global = grid.global_index(i[c], j[c], k[c]).ok_or_else(|| {
                PyValueError::new_err(format!(
                    "Connection cell ({}, {}, {}) is outside the grid or inactive",
                    i[c], j[c], k[c]
                ))
            })?;
            connections.push(Connection::new(global, state, ctf[c], depth[c], dir));
        }

        Ok(Self {
            inner: PAvgCalculator::new(&grid, &connections),
        })
    }

    /// Global IDs of the contributing cells, in source data order.
    #[getter]
    fn wbp_cells(&self) -> Vec<usize> {
        self.inner.all_wbp_cells().to_vec()
    }

    fn prune_inactive_wbp_cells(&mut self, is_active: Vec<bool>) -> PyResult<()> {
        self.inner
            .prune_inactive_wbp_cells(&is_active)
            .map_err(to_py_err)
    }

    /// Infer WBP, WBP4, WBP5 and WBP9.
    ///
    /// Block arrays are aligned with `wbp_cells`, `conn_density` with the
    /// connections given on construction.  `depth_correction` is one of
    /// "WELL" (default), "RES" or "NONE".
    #[pyo3(signature = (
        pressure,
        pore_vol,
        density,
        conn_density,
        inner_weight = 0.5,
        conn_weight = 1.0,
        depth_correction = None,
        open_connections = true,
        gravity = 9.80665,
        ref_depth = 0.0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn infer<'py>(
        &mut self,
        py: Python<'py>,
        pressure: PyReadonlyArray1<'py, f64>,
        pore_vol: PyReadonlyArray1<'py, f64>,
        density: PyReadonlyArray1<'py, f64>,
        conn_density: PyReadonlyArray1<'py, f64>,
        inner_weight: f64,
        conn_weight: f64,
        depth_correction: Option<String>,
        open_connections: bool,
        gravity: f64,
        ref_depth: f64,
    ) -> PyResult<Bound<'py, PyDict>> {
        let cells = self.inner.all_wbp_cells().to_vec();
        check_len("pressure", pressure.as_array().len(), cells.len())?;
        check_len("pore_vol", pore_vol.as_array().len(), cells.len())?;
        check_len("density", density.as_array().len(), cells.len())?;

        let conns = self.inner.all_well_connections();
        check_len("conn_density", conn_density.as_array().len(), conns.len())?;

        let unused: Array1<f64> = Array1::zeros(conns.len());
        let sources = Sources::new(
            PAvgDynamicSourceData::from_columns(
                &cells,
                pressure.as_array(),
                pore_vol.as_array(),
                density.as_array(),
            )
            .map_err(to_py_err)?,
            PAvgDynamicSourceData::from_columns(
                &conns,
                unused.view(),
                unused.view(),
                conn_density.as_array(),
            )
            .map_err(to_py_err)?,
        );

        let depth_correction = depth_correction
            .as_deref()
            .map(DepthCorrection::from)
            .unwrap_or(DepthCorrection::Well);
        let controls = PAvgControls::new(
            inner_weight,
            conn_weight,
            depth_correction,
            open_connections,
        );

        let result = *self
            .inner
            .infer_block_average_pressures(&sources, &controls, gravity, ref_depth)
            .map_err(to_py_err)?;

        let out = PyDict::new_bound(py);
        for mode in WbpMode::ALL.iter() {
            out.set_item(mode.name(), result.value(*mode))?;
        }
        Ok(out)
    }
}

//wrapper
#[pyfunction]
#[pyo3(name = "pressure_offset")]
fn pressure_offset_py<'py>(
    py: Python<'py>,
    density: PyReadonlyArray1<'py, f64>,
    depth: PyReadonlyArray1<'py, f64>,
    gravity: f64,
    ref_depth: f64,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let dp = pressure_offsets(density.as_array(), depth.as_array(), gravity, ref_depth)
        .map_err(to_py_err)?;
    Ok(dp.into_pyarray_bound(py))
}

#[pymodule]
fn pywellpavg(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPAvgCalculator>()?;
    m.add_function(wrap_pyfunction!(pressure_offset_py, m)?)?;
    Ok(())
}
