use std::path::PathBuf;

use atelier_store::BackendKind;
use atelier_types::{PieceStatus, Unit};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "atelier",
    about = "Atelier: an inventory tracker for art pieces",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (defaults to ./atelier.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for the local snapshot and uploaded images
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List art pieces, newest first
    List(ListArgs),
    /// Show one art piece
    Show(ShowArgs),
    /// Add an art piece
    Add(AddArgs),
    /// Update fields of an art piece
    Update(UpdateArgs),
    /// Remove an art piece and its image
    Remove(RemoveArgs),
    /// Run an add/update/remove round trip against an in-process backend
    Probe(ProbeArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Only pieces with this status
    #[arg(long)]
    pub status: Option<PieceStatus>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub artist: String,
    #[arg(long)]
    pub year: i32,
    #[arg(long)]
    pub width: f64,
    #[arg(long)]
    pub height: f64,
    #[arg(long)]
    pub depth: Option<f64>,
    #[arg(long, default_value = "cm")]
    pub unit: Unit,
    #[arg(long)]
    pub medium: String,
    /// URL of an already hosted image
    #[arg(long, required_unless_present = "image", conflicts_with = "image")]
    pub image_url: Option<String>,
    /// Image file to upload
    #[arg(long)]
    pub image: Option<PathBuf>,
    #[arg(long, default_value = "available")]
    pub status: PieceStatus,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long, requires = "price")]
    pub currency: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub provenance: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub artist: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub medium: Option<String>,
    #[arg(long)]
    pub status: Option<PieceStatus>,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long)]
    pub currency: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub provenance: Option<String>,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ProbeArgs {
    #[arg(long, default_value = "local")]
    pub backend: BackendKind,
}
