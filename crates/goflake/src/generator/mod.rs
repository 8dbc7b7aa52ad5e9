mod config;
mod flake;
#[cfg(test)]
mod tests;

pub use config::*;
pub use flake::*;
