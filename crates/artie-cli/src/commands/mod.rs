//! Command handlers grouped by API resource.

pub(crate) mod deployments;
pub(crate) mod source_readers;
