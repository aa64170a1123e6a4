//! Headless mode for scripted testing
//!
//! Runs the slot simulation without any graphical output: a JSON script
//! presses and holds slot keys, targeting sessions are answered
//! automatically, and a JSON summary is written at the end.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --headless run_config.json --seed 42
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "max_duration_secs": 12,
//!   "random_seed": 42,
//!   "target_point": [6.0, 4.0],
//!   "script": [
//!     { "at": 3.0, "slot": 0 },
//!     { "at": 4.0, "slot": 2, "hold_secs": 0.8 }
//!   ]
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessRunConfig, ScriptedPress};
pub use runner::{build_headless_app, run_headless, HeadlessRunState, RunSummary, SlotSummary};
