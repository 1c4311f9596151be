//! The three stages wired together for one plot.

use crate::coords::{assemble_coordinates, CoordinateTable, RawFeature};
use crate::error::{DotplotError, Result};
use crate::hits::{assemble_hits, AnchorSet, GenePair, HitAssembly};
use crate::triangle::{project, Projection};

/// Everything computed for one dot plot.
#[derive(Debug, Clone)]
pub struct DotPlot {
    /// Unfiltered axis layout.
    pub coords: CoordinateTable,
    pub hits: HitAssembly,
    pub projection: Projection,
}

impl DotPlot {
    /// Lay out the axis, resolve the relationships and fold them.
    ///
    /// Fails on malformed coordinates, on an empty relationship list and
    /// when no element is left to draw. Relationships that do not resolve
    /// are reported in `hits.summary`; ending up with no hits at all is only
    /// accepted when the length filter removed some of them.
    pub fn build(
        features: &[RawFeature],
        pairs: &[GenePair],
        anchors: Option<&AnchorSet>,
        min_element_length: u64,
    ) -> Result<Self> {
        if pairs.is_empty() {
            return Err(DotplotError::EmptyInput("no relationships to plot".to_string()));
        }
        let coords = assemble_coordinates(features)?;
        let hits = assemble_hits(&coords, pairs, min_element_length, anchors);
        if hits.accepted.is_empty() && hits.filtered_out(&coords) == 0 {
            return Err(DotplotError::EmptyInput(format!(
                "none of the {} relationships reference genes in the coordinate table",
                hits.summary.total
            )));
        }
        let projection = project(&hits.accepted, &hits.coords)?;
        Ok(DotPlot {
            coords,
            hits,
            projection,
        })
    }
}
