pub mod debounce;
pub mod engine;
pub mod error;
pub mod loader;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_utilities;
