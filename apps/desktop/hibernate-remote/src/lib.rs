// Library exports for testing
// The binary (main.rs) imports these as well

pub mod display;
pub mod error;
pub mod logger;
pub mod paths;
pub mod settings;

#[cfg(test)]
mod tests;
