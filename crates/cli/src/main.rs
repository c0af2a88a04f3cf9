//! Llama Treats CLI - offline tools for checking specials and carts.
//!
//! # Usage
//!
//! ```bash
//! # Which specials does this cart qualify for, and how close is it to the rest?
//! lt-cli specials evaluate --catalog catalog.json --cart cart.json
//!
//! # Same, as of a given moment (specials have date windows)
//! lt-cli specials evaluate --catalog catalog.json --cart cart.json --at 2024-06-15T10:00:00Z
//!
//! # Subtotal, tax and total for a cart
//! lt-cli cart price --cart cart.json --tax-rate 0.085
//! ```
//!
//! `catalog.json` has the bakery API's shape (`products`, `categories`,
//! `specials`, ...); `cart.json` is a cart snapshot as the storefront stores it.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TAX_RATE` - default for `--tax-rate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "lt-cli")]
#[command(author, version, about = "Llama Treats CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect specials against a cart
    Specials {
        #[command(subcommand)]
        action: SpecialsAction,
    },
    /// Inspect a cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum SpecialsAction {
    /// Show eligibility and progress for every live special
    Evaluate {
        /// Catalog JSON file
        #[arg(long)]
        catalog: PathBuf,

        /// Cart snapshot JSON file
        #[arg(long)]
        cart: PathBuf,

        /// Evaluate as of this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Sales tax rate as a fraction
        #[arg(long, env = "STOREFRONT_TAX_RATE", default_value = "0.085")]
        tax_rate: Decimal,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the lines and the rounded subtotal, tax and total
    Price {
        /// Cart snapshot JSON file
        #[arg(long)]
        cart: PathBuf,

        /// Sales tax rate as a fraction
        #[arg(long, env = "STOREFRONT_TAX_RATE", default_value = "0.085")]
        tax_rate: Decimal,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(report) => emit(&report),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String, commands::CommandError> {
    match cli.command {
        Commands::Specials { action } => match action {
            SpecialsAction::Evaluate {
                catalog,
                cart,
                at,
                tax_rate,
            } => {
                let now = at.unwrap_or_else(Utc::now);
                commands::specials::evaluate(&catalog, &cart, now, tax_rate)
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Price { cart, tax_rate } => commands::cart::price(&cart, tax_rate),
        },
    }
}

/// Reports are the command's output, so they go to stdout.
#[allow(clippy::print_stdout)]
fn emit(report: &str) {
    println!("{report}");
}
