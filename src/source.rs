// Dynamic source terms for block-average pressures

use std::collections::HashMap;
use std::ops::Index;

use ndarray::{Array2, ArrayView1, ArrayViewMut1};

use crate::error::PAvgError;

/// Quantity stored for each source location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceItem {
    /// Dynamic pressure value (Pa)
    Pressure = 0,
    /// Dynamic mixture density (kg/m^3)
    MixtureDensity = 1,
    /// Dynamic pore volume (m^3)
    PoreVol = 2,
}

const NUM_ITEMS: usize = 3;

/// Read-only view of the items at one source location.
#[derive(Clone, Copy, Debug)]
pub struct SourceDataSpan<'a> {
    row: ArrayView1<'a, f64>,
}

impl<'a> SourceDataSpan<'a> {
    pub fn get(&self, item: SourceItem) -> f64 {
        self.row[item as usize]
    }
}

impl<'a> Index<SourceItem> for SourceDataSpan<'a> {
    type Output = f64;

    fn index(&self, item: SourceItem) -> &f64 {
        &self.row[item as usize]
    }
}

/// Mutable view of the items at one source location.
#[derive(Debug)]
pub struct SourceDataSpanMut<'a> {
    row: ArrayViewMut1<'a, f64>,
}

impl<'a> SourceDataSpanMut<'a> {
    pub fn set(&mut self, item: SourceItem, value: f64) -> &mut Self {
        self.row[item as usize] = value;
        self
    }

    pub fn get(&self, item: SourceItem) -> f64 {
        self.row[item as usize]
    }
}

/// Pressure, pore volume and mixture density at a set of source locations
///
/// Storage is dense and ordered as the location list given on construction.
/// Locations are looked up by their ID, which is a global cell ID for well
/// blocks and a connection index for well connections.
#[derive(Clone, Debug, PartialEq)]
pub struct PAvgDynamicSourceData {
    src: Array2<f64>,
    ix: HashMap<usize, usize>,
}

impl PAvgDynamicSourceData {
    /// All items zero at every location.  Repeated locations share the
    /// storage of their first occurrence.
    pub fn new(source_locations: &[usize]) -> Self {
        let mut ix = HashMap::with_capacity(source_locations.len());
        for (pos, &loc) in source_locations.iter().enumerate() {
            ix.entry(loc).or_insert(pos);
        }
        Self {
            src: Array2::zeros([source_locations.len(), NUM_ITEMS]),
            ix,
        }
    }

    /// Source data from one column per item, aligned with `source_locations`.
    ///
    /// Every column must have exactly one entry per location.
    pub fn from_columns(
        source_locations: &[usize],
        pressure: ArrayView1<'_, f64>,
        pore_vol: ArrayView1<'_, f64>,
        mixture_density: ArrayView1<'_, f64>,
    ) -> Result<Self, PAvgError> {
        let columns = [
            ("pressure", SourceItem::Pressure, pressure.view()),
            ("pore_vol", SourceItem::PoreVol, pore_vol.view()),
            ("mixture_density", SourceItem::MixtureDensity, mixture_density.view()),
        ];

        let mut data = Self::new(source_locations);
        for (column, item, values) in columns.iter() {
            if values.len() != source_locations.len() {
                return Err(PAvgError::SourceColumnSize {
                    column: *column,
                    expected: source_locations.len(),
                    actual: values.len(),
                });
            }
            data.src.column_mut(*item as usize).assign(values);
        }
        Ok(data)
    }

    pub fn num_locations(&self) -> usize {
        self.src.nrows()
    }

    pub fn get(&self, location: usize) -> Result<SourceDataSpan<'_>, PAvgError> {
        let pos = self.position(location)?;
        Ok(SourceDataSpan {
            row: self.src.row(pos),
        })
    }

    pub fn get_mut(&mut self, location: usize) -> Result<SourceDataSpanMut<'_>, PAvgError> {
        let pos = self.position(location)?;
        Ok(SourceDataSpanMut {
            row: self.src.row_mut(pos),
        })
    }

    fn position(&self, location: usize) -> Result<usize, PAvgError> {
        self.ix
            .get(&location)
            .copied()
            .ok_or(PAvgError::UnknownSourceLocation(location))
    }
}

/// Source data for one well: one entry per contributing cell and one per
/// well connection.
#[derive(Clone, Debug, PartialEq)]
pub struct Sources {
    pub well_blocks: PAvgDynamicSourceData,
    pub well_conns: PAvgDynamicSourceData,
}

impl Sources {
    pub fn new(well_blocks: PAvgDynamicSourceData, well_conns: PAvgDynamicSourceData) -> Self {
        Self {
            well_blocks,
            well_conns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn lookup_by_location_id() {
        let mut data = PAvgDynamicSourceData::new(&[17, 3, 42]);
        data.get_mut(3)
            .unwrap()
            .set(SourceItem::Pressure, 250.0)
            .set(SourceItem::PoreVol, 12.5);

        let span = data.get(3).unwrap();
        assert_eq!(span[SourceItem::Pressure], 250.0);
        assert_eq!(span.get(SourceItem::PoreVol), 12.5);
        assert_eq!(span[SourceItem::MixtureDensity], 0.0);
        assert_eq!(data.get(17).unwrap()[SourceItem::Pressure], 0.0);
    }

    #[test]
    fn unknown_location_is_an_error() {
        let data = PAvgDynamicSourceData::new(&[1, 2]);
        assert!(matches!(
            data.get(5),
            Err(PAvgError::UnknownSourceLocation(5))
        ));
    }

    #[test]
    fn columns_are_aligned_with_locations() {
        let data = PAvgDynamicSourceData::from_columns(
            &[8, 9],
            array![100.0, 90.0].view(),
            array![10.0, 5.0].view(),
            array![800.0, 900.0].view(),
        )
        .unwrap();
        assert_eq!(data.num_locations(), 2);
        let span = data.get(9).unwrap();
        assert_eq!(span[SourceItem::Pressure], 90.0);
        assert_eq!(span[SourceItem::PoreVol], 5.0);
        assert_eq!(span[SourceItem::MixtureDensity], 900.0);
    }

    #[test]
    fn short_column_is_an_error() {
        let err = PAvgDynamicSourceData::from_columns(
            &[5, 6],
            array![100.0].view(),
            array![1.0, 1.0].view(),
            array![0.0, 0.0].view(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PAvgError::SourceColumnSize {
                column: "pressure",
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn long_column_is_an_error() {
        assert!(matches!(
            PAvgDynamicSourceData::from_columns(
                &[5, 6],
                array![100.0, 90.0].view(),
                array![1.0, 1.0].view(),
                array![0.0, 0.0, 0.0].view(),
            ),
            Err(PAvgError::SourceColumnSize {
                column: "mixture_density",
                expected: 2,
                actual: 3
            })
        ));
    }
}
