//! Bundled starter inventory used when no local snapshot exists.

use atelier_types::ArtPiece;
use tracing::error;

const SEED_JSON: &str = include_str!("../seed/pieces.json");

/// The seed dataset, newest first.
pub fn seed_pieces() -> Vec<ArtPiece> {
    match serde_json::from_str::<Vec<ArtPiece>>(SEED_JSON) {
        Ok(mut pieces) => {
            pieces.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            pieces
        }
        Err(e) => {
            error!(error = %e, "bundled seed data is unreadable");
            Vec::new()
        }
    }
}
