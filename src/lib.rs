//! VibeCast Library
//!
//! Front ends for the show-control engine: the headless NDJSON mirror and the
//! one-shot commands used by the `vibecast` binary.

pub mod headless;
pub mod oneshot;

pub use headless::run_headless;
