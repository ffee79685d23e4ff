//! Minimal 3D math shared by the rig utilities.

mod core;

pub use core::{Axis, BBox, Euler, Point3, Tolerance, Transform, Vec3};
