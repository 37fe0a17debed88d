//! Command handlers

pub mod admin;
pub mod public;
pub mod user;

use anyhow::Result;
use serde::Serialize;

/// Print a result as pretty JSON
pub fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
