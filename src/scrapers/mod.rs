pub mod browser;
pub mod extractors;
pub mod navigator;
pub mod pipeline;
pub mod sanitizer;
pub mod scroll;
pub mod session;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use browser::ChromeProvider;
pub use pipeline::Pipeline;
