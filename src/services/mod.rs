pub mod clock;
pub mod progress;
pub mod provider;
pub mod registry;
pub mod runner;
pub mod storage;
