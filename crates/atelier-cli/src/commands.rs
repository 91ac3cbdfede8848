use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use atelier_collection::PieceCollection;
use atelier_media::{mime_for, to_data_url, ImageStore};
use atelier_store::{BackendFactory, Collaborators};
use atelier_types::{ArtPiece, ArtPiecePatch, Dimensions, NewArtPiece, PieceId, PieceStatus};
use bytes::Bytes;
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;
use crate::config::AtelierConfig;
use crate::probe::run_probe;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = AtelierConfig::load(cli.config.as_deref())?.with_data_dir(cli.data_dir);
    let format = cli.format;
    match cli.command {
        Command::List(args) => cmd_list(&config, args, format).await,
        Command::Show(args) => cmd_show(&config, args, format).await,
        Command::Add(args) => cmd_add(&config, args, format).await,
        Command::Update(args) => cmd_update(&config, args, format).await,
        Command::Remove(args) => cmd_remove(&config, args).await,
        Command::Probe(args) => cmd_probe(&config, args, format).await,
    }
}

/// Collection over the configured backend, loaded from disk.
async fn open_collection(
    config: &AtelierConfig,
) -> anyhow::Result<(PieceCollection, Option<Arc<dyn ImageStore>>)> {
    let clients = Collaborators::on_disk(&config.store)?;
    let backend = BackendFactory::open(&config.store, &clients).await?;
    let images = config.media.open()?;
    let collection = PieceCollection::new(backend, images.clone());
    collection.refresh().await;
    Ok((collection, images))
}

async fn cmd_list(config: &AtelierConfig, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (collection, _) = open_collection(config).await?;
    let pieces: Vec<ArtPiece> = collection
        .snapshot()
        .into_iter()
        .filter(|p| args.status.map_or(true, |s| p.status == s))
        .collect();

    if format == OutputFormat::Json {
        return print_json(&pieces);
    }
    if pieces.is_empty() {
        println!("No art pieces.");
        return Ok(());
    }
    for piece in &pieces {
        println!(
            "{}  {} by {} ({})  {}  {}",
            piece.id.short_id().yellow(),
            piece.title.bold(),
            piece.artist,
            piece.year,
            status_label(piece.status),
            piece.price_label().unwrap_or_default().dimmed(),
        );
    }
    println!("\n{} piece(s)", pieces.len().to_string().bold());
    Ok(())
}

async fn cmd_show(config: &AtelierConfig, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (collection, _) = open_collection(config).await?;
    let piece = collection.find(&PieceId::new(args.id))?;
    if format == OutputFormat::Json {
        return print_json(&piece);
    }
    print_piece(&piece);
    Ok(())
}

async fn cmd_add(config: &AtelierConfig, args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (collection, images) = open_collection(config).await?;
    let image = args.image.clone();
    let mut draft = draft_from_args(args);

    if let Some(path) = image {
        let bytes = Bytes::from(
            tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read image {}", path.display()))?,
        );
        let file_name = file_name_of(&path);
        match &images {
            Some(images) => {
                let owner = PieceId::generate();
                let show_progress = format == OutputFormat::Text;
                let uploaded = images
                    .upload_with_progress(bytes, &file_name, owner.as_str(), &|percent: u8| {
                        if show_progress {
                            eprint!("\r  uploading {file_name} {percent:>3}%");
                            let _ = std::io::stderr().flush();
                        }
                    })
                    .await?;
                if show_progress {
                    eprintln!();
                }
                draft.image_url = uploaded.url;
                draft.image_path = Some(uploaded.reference);
            }
            None => draft.image_url = to_data_url(&bytes, mime_for(&file_name)),
        }
    }

    let reference = draft.image_path.clone();
    let piece = match collection.add(draft).await {
        Ok(piece) => piece,
        Err(e) => {
            // The record never landed, so its freshly uploaded image is orphaned.
            if let (Some(images), Some(reference)) = (&images, reference) {
                let _ = images.discard(&reference).await;
            }
            return Err(e.into());
        }
    };

    if format == OutputFormat::Json {
        return print_json(&piece);
    }
    println!("{} Added {} ({})", "✓".green().bold(), piece.title.bold(), piece.id.to_string().yellow());
    Ok(())
}

async fn cmd_update(config: &AtelierConfig, args: UpdateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (collection, _) = open_collection(config).await?;
    let id = PieceId::new(args.id.clone());
    let patch = patch_from_args(args);
    if patch.is_empty() {
        bail!("nothing to update; pass at least one field");
    }
    let piece = collection.update_piece(&id, patch).await?;

    if format == OutputFormat::Json {
        return print_json(&piece);
    }
    println!("{} Updated {} ({})", "✓".green().bold(), piece.title.bold(), status_label(piece.status));
    Ok(())
}

async fn cmd_remove(config: &AtelierConfig, args: RemoveArgs) -> anyhow::Result<()> {
    let (collection, _) = open_collection(config).await?;
    collection.remove(&PieceId::new(args.id.clone())).await?;
    println!("{} Removed {}", "✓".green().bold(), args.id.yellow());
    Ok(())
}

async fn cmd_probe(config: &AtelierConfig, args: ProbeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let report = run_probe(args.backend, &config.store).await?;

    if format == OutputFormat::Json {
        print_json(&report)?;
    } else {
        println!("Probing {} backend", report.backend.to_string().bold());
        for check in &report.checks {
            let mark = if check.passed { "✓".green() } else { "✗".red() };
            println!("  {mark} {}", check.name);
        }
    }
    if !report.passed() {
        bail!("{} backend failed the probe", report.backend);
    }
    Ok(())
}

fn draft_from_args(args: AddArgs) -> NewArtPiece {
    let mut draft = NewArtPiece::new(
        args.title,
        args.artist,
        args.year,
        Dimensions {
            width: args.width,
            height: args.height,
            depth: args.depth,
            unit: args.unit,
        },
        args.medium,
        args.image_url.unwrap_or_default(),
    );
    draft.status = args.status;
    draft.price = args.price;
    draft.currency = args.currency;
    draft.location = args.location;
    draft.description = args.description;
    draft.provenance = args.provenance;
    draft
}

fn patch_from_args(args: UpdateArgs) -> ArtPiecePatch {
    ArtPiecePatch {
        title: args.title,
        artist: args.artist,
        year: args.year,
        medium: args.medium,
        status: args.status,
        price: args.price,
        currency: args.currency,
        location: args.location,
        description: args.description,
        provenance: args.provenance,
        ..Default::default()
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into())
}

fn status_label(status: PieceStatus) -> colored::ColoredString {
    let label = status.as_str();
    match status {
        PieceStatus::Available => label.green(),
        PieceStatus::Sold => label.red(),
        PieceStatus::OnHold => label.yellow(),
        PieceStatus::Exhibition => label.cyan(),
        PieceStatus::Damaged => label.magenta(),
    }
}

fn print_piece(piece: &ArtPiece) {
    println!("{} {}", piece.title.bold(), format!("({})", piece.id).dimmed());
    println!("  Artist:     {}", piece.artist);
    println!("  Year:       {}", piece.year);
    println!("  Medium:     {}", piece.medium);
    println!("  Dimensions: {}", piece.dimensions);
    println!("  Status:     {}", status_label(piece.status));
    if let Some(price) = piece.price_label() {
        println!("  Price:      {price}");
    }
    if let Some(location) = &piece.location {
        println!("  Location:   {location}");
    }
    if let Some(provenance) = &piece.provenance {
        println!("  Provenance: {provenance}");
    }
    if let Some(description) = &piece.description {
        println!("  {}", description.italic());
    }
    println!("  Image:      {}", piece.image_url.blue());
    println!("  Updated:    {}", piece.updated_at.to_rfc3339().dimmed());
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
