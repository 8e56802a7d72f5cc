//! Group-territory graph layout.
//!
//! [`layout`] is the simulation engine: nodes repel and collide while each
//! group claims a padded convex territory that keeps outsiders out and
//! pushes overlapping groups apart. [`dataset`] turns record files into the
//! node and group seeds the engine consumes.

pub mod dataset;
pub mod layout;
