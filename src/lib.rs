//! Turns Matrix timeline events into styled, measured rows, and tracks the
//! room list's leave confirmation.

pub mod config;
pub mod event;
pub mod markup;
pub mod matrix;
pub mod measure;
pub mod message;
pub mod state;
pub mod ui;
