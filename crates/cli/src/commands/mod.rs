pub mod backends;
pub mod native;
pub mod render;
pub mod util;

pub use backends::*;
pub use native::*;
pub use render::*;
pub use util::*;
