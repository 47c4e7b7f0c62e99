//! # Scale Crate
//!
//! Core of the MT-SICS balance simulator. Everything that touches the
//! simulated instrument lives here; the TCP and HTTP front-ends in the
//! `server` crate only ever talk to the [`Scale`] guard.
//!
//! ## Key Components
//!
//! - **Instrument State**: [`InstrumentState`] with rounding and clamping rules
//! - **Command Interpreter**: [`Command`] parsing and [`interpret`], producing a typed [`Response`]
//! - **State Guard**: [`Scale`], the single lock-protected owner of the state
//!
//! ```text
//! ┌──────────────┐   handle_command   ┌─────────────────────────────┐
//! │  TCP session │ ─────────────────▶ │            Scale            │
//! └──────────────┘                    │  Mutex<InstrumentState +    │
//! ┌──────────────┐   set_* / snapshot │         LastInteraction>    │
//! │ HTTP control │ ─────────────────▶ │                             │
//! └──────────────┘                    └─────────────────────────────┘
//! ```

pub mod command;
pub mod error;
pub mod guard;
pub mod state;

pub use command::{interpret, Command, Response};
pub use error::{CommandError, CommandResult};
pub use guard::{Scale, StateSnapshot};
pub use state::{round2, InstrumentState};
