//! Session controller: pure state machine plus effect application.

pub mod controller;
pub mod machine;

pub use controller::{Command, SessionController};
pub use machine::{transition, Effect, SessionEvent, SessionState, Transition};
