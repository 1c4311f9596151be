//! Whole-genome triangular dot plots.
//!
//! Genes from many chromosomes/scaffolds are placed on one concatenated
//! axis ([`coords`]), gene-gene relationships are resolved against that
//! axis ([`hits`]) and the symmetric point cloud is folded by 45° into a
//! triangle ([`triangle`]) that [`render`] draws as PNG or SVG.

pub mod coords;
pub mod error;
pub mod hits;
pub mod loaders;
pub mod pipeline;
pub mod render;
pub mod triangle;

pub use coords::{assemble_coordinates, CoordinateTable, FeatureRecord, GenomicElement, RawFeature};
pub use error::{DotplotError, Result};
pub use hits::{assemble_hits, AnchorSet, GenePair, HitAssembly, HitSummary, PairKey, PairwiseHit};
pub use pipeline::DotPlot;
pub use render::{write_plot, PlotStyle};
pub use triangle::{project, Projection};
