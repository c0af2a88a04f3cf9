//! CLI subcommands. Each returns its report as a string for `main` to print.

pub mod cart;
pub mod specials;

use std::path::{Path, PathBuf};

use llama_treats_core::{Cart, CartError, TaxRate, TaxRateError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Input file could not be read.
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input file is not the expected JSON.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Cart snapshot breaks the cart rules.
    #[error("Invalid cart: {0}")]
    Cart(#[from] CartError),

    /// Tax rate outside `[0, 1)`.
    #[error("Invalid tax rate: {0}")]
    TaxRate(#[from] TaxRateError),
}

fn read(path: &Path) -> Result<String, CommandError> {
    std::fs::read_to_string(path).map_err(|source| CommandError::Read {
        path: path.to_owned(),
        source,
    })
}

/// Load a cart snapshot file.
fn load_cart(path: &Path, tax_rate: Decimal) -> Result<Cart, CommandError> {
    let tax_rate = TaxRate::new(tax_rate)?;
    let json = read(path)?;
    Ok(Cart::from_snapshot_json(&json, tax_rate)?)
}

/// Load and parse a JSON file.
fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let json = read(path)?;
    serde_json::from_str(&json).map_err(|source| CommandError::Json {
        path: path.to_owned(),
        source,
    })
}
