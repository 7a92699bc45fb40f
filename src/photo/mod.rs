//! Edge-aware photo filters.

pub mod amf;

pub use amf::{
    AdaptiveManifoldFilter, DomainTransformFilter, am_filter, create_amf,
};
