mod decompose;
mod error;
mod generator;
mod layout;
mod sequence;
mod time;

pub use crate::decompose::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::sequence::*;
pub use crate::time::*;
