pub mod image;
pub mod params;

pub use image::*;
pub use params::*;
