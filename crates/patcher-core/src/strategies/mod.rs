//! Built-in patch strategies

mod local_legal_name;

pub use local_legal_name::{LocalLegalNamePatch, LOCAL_LEGAL_NAME};
