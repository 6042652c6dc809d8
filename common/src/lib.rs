//! Shared building blocks for hibernate-remote.
//!
//! Holds the pieces every other crate in the workspace leans on, chiefly
//! [`ErrorLocation`], which every error variant carries so a log line points
//! straight at the code that produced it.

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
