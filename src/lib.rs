//! Soma segmentation and pixel-graph construction for neuron microscopy rasters.
//!
//! The pipeline segments individual cell bodies (somas) out of a microscopy
//! image, classifies every pixel as soma, dendrite or background, and builds
//! an 8-connected adjacency graph over all non-background pixels for later
//! topological analysis. [`pipeline::analyze`] runs the whole thing; the
//! stage functions are exposed individually for inspection and testing.

pub mod classify;
pub mod color;
pub mod error;
pub mod graph;
pub mod outline;
pub mod paths;
pub mod pipeline;
pub mod preprocess;
pub mod segment;
pub mod soma;

pub use classify::{ClassificationMap, PixelClass};
pub use error::{Error, Result};
pub use graph::{Direction, NodeId, PixelGraph, PixelNode};
pub use pipeline::{Analysis, AnalysisSummary, analyze, load_rgb, open_rgb};
pub use soma::Soma;
