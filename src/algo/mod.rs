//! Geometry primitives behind the junction pipelines.
//!
//! - **Smoothing**: Laplacian and Taubin λ|μ smoothing
//! - **Classification**: wall/cap face patches by feature angle
//! - **Caps**: ear clipping, refinement and relaxation of boundary loops
//! - **Repair**: degenerate removal, welding, hole filling

pub mod cap;
pub mod classify;
pub mod progress;
pub mod repair;
pub mod smooth;

pub use progress::Progress;
