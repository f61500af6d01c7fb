//! Detection normalizers.
//!
//! One submodule per detector kind. Each takes the detector's raw output schema and
//! produces canonical [`crate::interval::Interval`]s; none of them talk to the global
//! timeline directly (words arrive already rebased, frame reports carry their own
//! fps-derived timestamps).

pub mod topics;
pub mod visual;
pub mod words;
