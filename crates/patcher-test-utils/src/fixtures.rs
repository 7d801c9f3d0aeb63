//! Shared fixtures

use crate::lookup::ScriptedLookup;
use crate::store::InMemoryRecordStore;
use patcher_types::{Record, Tenant};

/// Tenant by id; ids outside the catalog get a lowercase country code
pub fn tenant(id: &str) -> Tenant {
    Tenant::new(id).unwrap_or_else(|_| Tenant::with_country(id, id.to_lowercase()))
}

/// Vendor awaiting repair
pub fn vendor(code: &str, name: &str) -> Record {
    Record::new(code, name)
}

/// Vendor with a local legal name already set
pub fn repaired_vendor(code: &str, name: &str, local_legal_name: &str) -> Record {
    Record::new(code, name).with_local_legal_name(local_legal_name)
}

/// Tenant T1 with vendors A (empty), B ("X"), C (empty); the service knows
/// only A
#[derive(Debug)]
pub struct T1Scenario {
    pub tenant: Tenant,
    pub store: InMemoryRecordStore,
    pub lookup: ScriptedLookup,
}

pub fn t1_scenario() -> T1Scenario {
    let t1 = tenant("T1");
    let store = InMemoryRecordStore::new().with_records(
        &t1,
        [
            vendor("A", "Vendor A"),
            repaired_vendor("B", "Vendor B", "X"),
            vendor("C", "Vendor C"),
        ],
    );
    let lookup = ScriptedLookup::new().with_value("A", "Legal A");

    T1Scenario {
        tenant: t1,
        store,
        lookup,
    }
}
