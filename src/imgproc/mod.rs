pub mod color;
pub mod filter;
pub mod geometric;
pub mod threshold;

pub use color::*;
pub use filter::*;
pub use geometric::*;
pub use threshold::*;
