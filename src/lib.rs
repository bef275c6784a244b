pub mod config;
pub mod edit_diff;
pub mod error;
pub mod extract;
pub mod logging;
pub mod message;
pub mod payload;
pub mod registry;
pub mod stream;
pub mod tool_preview;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
