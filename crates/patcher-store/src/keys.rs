//! Key layout of the ordering table
//!
//! ```text
//! PK = GEID#<tenant>
//! SK = GEID#<tenant>,VENDOR#<vendor_code>
//! ```

/// Partition key attribute
pub const PK: &str = "PK";

/// Sort key attribute
pub const SK: &str = "SK";

/// Vendor code attribute
pub const VENDOR_CODE: &str = "vendor_code";

/// Vendor display name attribute
pub const NAME: &str = "name";

/// Local legal name attribute
pub const LOCAL_LEGAL_NAME: &str = "local_legal_name";

/// Partition key holding every row of a tenant
#[must_use]
pub fn vendor_pk(tenant_id: &str) -> String {
    format!("GEID#{tenant_id}")
}

/// Sort key of one vendor row
#[must_use]
pub fn vendor_sk(tenant_id: &str, vendor_code: &str) -> String {
    format!("{}#{vendor_code}", vendor_sk_prefix(tenant_id))
}

/// Sort key prefix shared by all vendor rows of a tenant
#[must_use]
pub fn vendor_sk_prefix(tenant_id: &str) -> String {
    format!("GEID#{tenant_id},VENDOR")
}
