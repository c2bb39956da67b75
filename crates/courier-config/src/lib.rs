// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Courier dispatch service.
//!
//! Figment-based layered loading (defaults, XDG TOML hierarchy, `COURIER_`
//! environment variables) into strictly-validated model structs.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CourierConfig;
