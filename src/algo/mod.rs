//! Mesh processing algorithms.
//!
//! - **MFE smoothing** ([`mfe`]): moving finite element relaxation of node
//!   positions under quality, area and triple-line forces
//! - **Progress** ([`progress`]): progress callbacks and cooperative cancellation

pub mod mfe;
pub mod progress;

pub use progress::{CancelFlag, Progress};
