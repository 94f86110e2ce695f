//! Built-in providers
//!
//! Only the dummy backend lives in the core crate; real backends ship as
//! their own crates and register through [`crate::FactoryRegistry`].

pub mod dummy;

pub use dummy::{DummyFactory, DummyProvider};
