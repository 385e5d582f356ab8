//! Wire, geometry, and configuration types shared across the argus stack.
//!
//! Everything here is plain data: the geometry of captures and regions,
//! the session configuration surface, and the result types exchanged with
//! the remote matching service. No I/O happens in this crate.

pub mod geometry;
pub mod options;
pub mod results;

pub use geometry::{Location, RectangleSize, Region};
pub use options::{FailureReport, InvalidRotation, SessionConfig, StitchMode};
pub use results::{MatchResult, SessionStartInfo, TestResults};
