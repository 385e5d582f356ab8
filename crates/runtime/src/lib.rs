//! Runtime layer for argus: the sequential control-flow queue every session
//! operation is threaded through, the error types of the whole stack, and
//! the trait seams for the automation-driver collaborator.

pub mod driver;
pub mod error;
pub mod flow;

pub use driver::{Capabilities, Driver, Element, Locator, Orientation};
pub use error::{Error, Result};
pub use flow::ControlFlow;
