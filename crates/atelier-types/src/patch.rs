use serde::{Deserialize, Serialize};

use crate::piece::{ArtPiece, Dimensions, PieceStatus};
use crate::temporal::touch;

/// A partial update to an [`ArtPiece`].
///
/// Only fields that are `Some` are applied. The identity and creation time
/// are not representable here; when a patch is decoded from JSON, `id`,
/// `createdAt` and `updatedAt` keys are dropped silently.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtPiecePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PieceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
}

impl ArtPiecePatch {
    pub fn status(status: PieceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: f64, currency: Option<String>) -> Self {
        self.price = Some(price);
        if currency.is_some() {
            self.currency = currency;
        }
        self
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ArtPiece {
    /// Merge `patch` into this piece and refresh `updated_at`.
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply(&mut self, patch: ArtPiecePatch) {
        let ArtPiecePatch {
            title,
            artist,
            year,
            dimensions,
            medium,
            description,
            image_url,
            image_path,
            status,
            price,
            currency,
            location,
            provenance,
        } = patch;

        merge(&mut self.title, title);
        merge(&mut self.artist, artist);
        merge(&mut self.year, year);
        merge(&mut self.dimensions, dimensions);
        merge(&mut self.medium, medium);
        merge(&mut self.image_url, image_url);
        merge(&mut self.status, status);
        merge_optional(&mut self.description, description);
        merge_optional(&mut self.image_path, image_path);
        merge_optional(&mut self.price, price);
        merge_optional(&mut self.currency, currency);
        merge_optional(&mut self.location, location);
        merge_optional(&mut self.provenance, provenance);

        self.updated_at = touch(self.updated_at);
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn merge_optional<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PieceId;
    use crate::piece::{NewArtPiece, Unit};
    use chrono::Utc;
    use serde_json::json;

    fn piece() -> ArtPiece {
        let draft = NewArtPiece::new(
            "A",
            "B",
            2024,
            Dimensions::flat(10.0, 10.0, Unit::Cm),
            "Oil",
            "http://x/1.jpg",
        );
        ArtPiece::from_draft(PieceId::new("p-1"), draft, Utc::now())
    }

    #[test]
    fn apply_status_and_price() {
        let mut p = piece();
        let created = p.created_at;
        p.apply(ArtPiecePatch::status(PieceStatus::Sold).with_price(100.0, None));

        assert_eq!(p.status, PieceStatus::Sold);
        assert_eq!(p.price, Some(100.0));
        assert_eq!(p.created_at, created);
        assert!(p.updated_at > p.created_at);
        assert_eq!(p.title, "A");
    }

    #[test]
    fn empty_patch_only_touches_timestamp() {
        let mut p = piece();
        let before = p.clone();
        p.apply(ArtPiecePatch::default());
        assert!(p.updated_at > before.updated_at);
        p.updated_at = before.updated_at;
        assert_eq!(p, before);
    }

    #[test]
    fn identity_fields_are_stripped_when_decoding() {
        let patch: ArtPiecePatch = serde_json::from_value(json!({
            "id": "hijacked",
            "createdAt": "1999-01-01T00:00:00Z",
            "updatedAt": "1999-01-01T00:00:00Z",
            "location": "Vault 3"
        }))
        .unwrap();

        let mut p = piece();
        let created = p.created_at;
        p.apply(patch);
        assert_eq!(p.id, PieceId::new("p-1"));
        assert_eq!(p.created_at, created);
        assert_eq!(p.location.as_deref(), Some("Vault 3"));
    }

    #[test]
    fn serialized_patch_omits_unset_fields() {
        let patch = ArtPiecePatch::status(PieceStatus::OnHold);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"status": "on_hold"}));
        assert!(!patch.is_empty());
        assert!(ArtPiecePatch::default().is_empty());
    }
}
