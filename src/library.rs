//! Music library: the `Track` model and the directory scanner that builds it.

mod display;
mod model;
mod scan;

pub use model::{MediaSource, Track};
pub use scan::scan;
