//! Incoming operational requests.
//!
//! A [`Request`] is the immutable input to a department pipeline. It names
//! the owning [`Department`], what kind of work is asked for, where, with
//! which resources, at what cost and with which [`Priority`].

pub mod department;
pub mod entities;
pub mod priority;

pub use department::Department;
pub use entities::Request;
pub use priority::Priority;
