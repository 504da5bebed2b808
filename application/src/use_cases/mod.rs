//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod check_conflicts;
pub mod coordinate;
pub mod decide;
pub mod negotiate;
pub mod router;
pub(crate) mod shared;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod test_support;
