//! Clocks, processing tokens, the error taxonomy and the backend service
//! registry shared by every MayaFlux crate.
//!
//! This crate has no knowledge of routines, nodes or buffers — it is the
//! leaf dependency every other crate in the workspace builds on, the way
//! `graal-spirv` sits under `graal`, which sits under `mlr`.

pub mod clock;
pub mod error;
pub mod region;
pub mod registry;
pub mod token;

pub use clock::{Clock, EventClock, FrameClock, SampleClock};
pub use error::{Component, Context, ErrorKind, MayaFluxError, Result};
pub use region::{Region, RegionGroup, RegionSegment};
pub use registry::BackendRegistry;
pub use token::{DelayContext, ProcessingToken, RoutineToken};
