//! Interactive session controller for procgen games.
//!
//! Flow: `config::build_config` → `factory::make_interactive` →
//! `session::Session::run` (one tick per input batch) → `display::Display`.

pub mod action;
pub mod command;
pub mod config;
pub mod display;
pub mod env;
pub mod error;
pub mod factory;
pub mod input;
pub mod recorder;
pub mod rng;
pub mod sandbox;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod types;
