//! Library side of the `ragent` binary: session setup, the offline mock model, and event
//! rendering. `main.rs` only parses arguments and wires these together.

pub mod run;

pub use run::{
    mock_model, truncate_display, EventRenderer, OutputMode, RunError, RunOptions, Session,
    TurnReport,
};
