mod counter;
mod ticker;

pub use counter::*;
pub use ticker::*;
