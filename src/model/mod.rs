pub mod artifact;
pub mod features;
pub mod precautions;
pub mod predict;

pub use artifact::*;
pub use features::*;
pub use precautions::*;
pub use predict::*;
