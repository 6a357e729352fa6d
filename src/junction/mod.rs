//! Junction detection and junction smoothing.
//!
//! A junction is a point where two or more vessel endpoints meet. The
//! surface generated around such a point tends to be rough, so this module
//! offers two ways to smooth it:
//!
//! - [`apply_junction_smoothing`]: smooth a neighborhood around every
//!   junction and write the smoothed points back into a copy of the mesh
//! - [`smooth_junctions_advanced`]: smooth whole wall patches and rebuild
//!   the end caps
//!
//! Both return an [`Outcome`] that says whether smoothing happened and which
//! fallbacks were taken.
//!
//! # Example
//!
//! ```
//! use vascular_junctions::junction::{junction_statistics, Vessel, VesselTree};
//! use nalgebra::Point3;
//!
//! let fork = Point3::new(0.0, 0.0, 1.0);
//! let tree = VesselTree::new(vec![
//!     Vessel::new(Point3::origin(), fork),
//!     Vessel::new(fork, Point3::new(1.0, 0.0, 2.0)),
//!     Vessel::new(fork, Point3::new(-1.0, 0.0, 2.0)),
//! ]);
//!
//! let stats = junction_statistics(&tree).unwrap();
//! assert_eq!(stats.total_junctions, 1);
//! assert_eq!(stats.junction_types[&3], 1);
//! ```

mod advanced;
mod detect;
mod outcome;
mod reassemble;
mod region;
mod stats;
mod vessel;

pub use advanced::{
    smooth_junctions_advanced, smooth_junctions_advanced_with, AdvancedOptions,
    DEFAULT_ELEMENT_SIZE,
};
pub use detect::{
    detect_junctions, detect_junctions_with, DetectOptions, Junction, JunctionSet, PointMatching,
};
pub use outcome::{Degradation, Outcome};
pub use reassemble::{
    apply_junction_smoothing, apply_junction_smoothing_with,
    apply_junction_smoothing_with_progress, JunctionSmoothOptions,
};
pub use region::{
    isolate_regions, region_point_ids, smooth_region, JunctionRegion, RegionOptions,
    RegionSmoothOptions,
};
pub use stats::{junction_statistics, JunctionStatistics};
pub use vessel::{Vessel, VesselTree};
