#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Intrusion-alarm control core (hardware-agnostic).
//!
//! All hardware and network access goes through the `alarm_traits`
//! collaborator traits. The crate splits into a pure decision layer and the
//! loop that feeds it:
//!
//! - **Detection**: debounced rising-edge motion detector (`detector`)
//! - **Schedule**: daily auto-arm window, midnight-crossing aware (`schedule`)
//! - **Decision**: `AlarmMachine::step` turns one cycle of inputs into state
//!   changes and a list of `Intent`s, with no I/O (`machine`)
//! - **Annunciation**: non-blocking chirp and phase-derived siren (`annunciator`)
//! - **Orchestration**: `Node` polls the remote store, runs the machine,
//!   executes intents and drives buzzer/LED (`node`)
//!
//! Time comes from the monotonic `Clock` for every debounce and timeout
//! computation; the `WallClock` is only consulted for the schedule window and
//! motion log timestamps.

pub mod annunciator;
pub mod atomic;
pub mod config;
pub mod conversions;
pub mod detector;
pub mod error;
pub mod file_store;
pub mod hw_error;
pub mod intent;
pub mod machine;
pub mod mocks;
pub mod node;
pub mod remote;
pub mod schedule;
pub mod state;
pub mod util;

pub use annunciator::{Annunciator, BuzzerOutput};
pub use config::{DeviceCfg, ScheduleConfig, TimingCfg};
pub use detector::{DetectionEvent, MotionDetector};
pub use error::{AlarmError, BuildError, Report, Result};
pub use file_store::JsonFileStore;
pub use intent::{Alert, Intent, SoundCue, Source};
pub use machine::{AlarmMachine, CycleInputs, ScheduleSample};
pub use node::{CycleReport, Node, NodeBuilder, RunSummary};
pub use remote::{Paths, RemoteCommand, parse_command};
pub use schedule::is_active;
pub use state::{AlarmState, Mode};
