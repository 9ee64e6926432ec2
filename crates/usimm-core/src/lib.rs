//! DRAM memory controller core: address decode, per-bank state machines,
//! JEDEC timing, the refresh governor, the command issuer, the power
//! model, and the pluggable scheduler policies (§4.1-§4.8).

pub mod address;
pub mod bank;
pub mod channel;
pub mod command;
pub mod controller;
pub mod faw;
mod issuer;
pub mod power;
pub mod queue;
pub mod rank;
pub mod refresh;
pub mod request;
pub mod scheduler;

pub use address::DecodedAddress;
pub use command::Command;
pub use controller::Controller;
pub use power::PowerReport;
pub use queue::{ReadEnqueueOutcome, WriteEnqueueOutcome};
pub use request::{NextCommand, Operation, Request, SchedulerTag};
pub use scheduler::{by_name as scheduler_by_name, SchedulerPolicy};
