//! Department data adapters

mod fixture;

pub use fixture::{FixtureDataAccess, FixtureError, FixtureSet};
