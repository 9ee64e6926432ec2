//! Configuration-file parsing and unit conversion (§6): the recognized
//! token set, the two-files-in-sequence (system + chip-electrical `.vi`)
//! loading rule, and the `Ticks`/`AddressMapping` types every other crate
//! in the workspace builds on.

mod config;
mod error;
mod mapping;
mod parser;
mod ticks;

pub use config::SimConfig;
pub use error::ConfigError;
pub use mapping::AddressMapping;
pub use parser::load;
pub use ticks::Ticks;
