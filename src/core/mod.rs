pub mod mat;
pub mod mat_typed;
pub mod types;
pub mod operations;

pub use mat::{Mat, MatDepth};
pub use types::*;
pub use operations::*;
