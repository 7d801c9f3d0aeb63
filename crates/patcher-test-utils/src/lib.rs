//! Testing utilities for the patcher workspace
//!
//! In-memory doubles for the two external collaborators plus fixtures.

#![allow(missing_docs)]

pub mod fixtures;
pub mod lookup;
pub mod store;

pub use fixtures::{repaired_vendor, t1_scenario, tenant, vendor, T1Scenario};
pub use lookup::ScriptedLookup;
pub use store::InMemoryRecordStore;
