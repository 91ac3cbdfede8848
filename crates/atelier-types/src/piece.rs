use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::id::PieceId;

/// Unit of measure for [`Dimensions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Cm,
    In,
    Mm,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cm => "cm",
            Self::In => "in",
            Self::Mm => "mm",
        })
    }
}

impl FromStr for Unit {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cm" => Ok(Self::Cm),
            "in" => Ok(Self::In),
            "mm" => Ok(Self::Mm),
            other => Err(TypeError::invalid("unit", format!("unknown unit {other:?}"))),
        }
    }
}

/// Physical size of a piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    pub unit: Unit,
}

impl Dimensions {
    /// Flat (two-dimensional) work.
    pub fn flat(width: f64, height: f64, unit: Unit) -> Self {
        Self {
            width,
            height,
            depth: None,
            unit,
        }
    }

    pub fn validate(&self) -> TypeResult<()> {
        positive("dimensions.width", self.width)?;
        positive("dimensions.height", self.height)?;
        if let Some(depth) = self.depth {
            positive("dimensions.depth", depth)?;
        }
        Ok(())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.depth {
            Some(depth) => write!(f, "{} x {} x {} {}", self.width, self.height, depth, self.unit),
            None => write!(f, "{} x {} {}", self.width, self.height, self.unit),
        }
    }
}

/// Inventory status. Any status may change to any other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceStatus {
    #[default]
    Available,
    Sold,
    OnHold,
    Exhibition,
    Damaged,
}

impl PieceStatus {
    pub const ALL: [PieceStatus; 5] = [
        Self::Available,
        Self::Sold,
        Self::OnHold,
        Self::Exhibition,
        Self::Damaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Sold => "sold",
            Self::OnHold => "on_hold",
            Self::Exhibition => "exhibition",
            Self::Damaged => "damaged",
        }
    }
}

impl fmt::Display for PieceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PieceStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TypeError::invalid("status", format!("unknown status {s:?}")))
    }
}

/// A draft art piece: everything except the id and timestamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtPiece {
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub dimensions: Dimensions,
    pub medium: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub status: PieceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
}

impl NewArtPiece {
    /// A minimal draft with the required fields and status `available`.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        year: i32,
        dimensions: Dimensions,
        medium: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            year,
            dimensions,
            medium: medium.into(),
            description: None,
            image_url: image_url.into(),
            image_path: None,
            status: PieceStatus::Available,
            price: None,
            currency: None,
            location: None,
            provenance: None,
        }
    }

    pub fn validate(&self) -> TypeResult<()> {
        non_empty("title", &self.title)?;
        non_empty("artist", &self.artist)?;
        non_empty("medium", &self.medium)?;
        non_empty("imageUrl", &self.image_url)?;
        self.dimensions.validate()?;
        check_price(self.price, self.currency.as_deref())
    }
}

/// One artwork record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtPiece {
    pub id: PieceId,
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub dimensions: Dimensions,
    pub medium: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub status: PieceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArtPiece {
    /// Materialize a draft. Both timestamps are set to `at`.
    pub fn from_draft(id: PieceId, draft: NewArtPiece, at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            artist: draft.artist,
            year: draft.year,
            dimensions: draft.dimensions,
            medium: draft.medium,
            description: draft.description,
            image_url: draft.image_url,
            image_path: draft.image_path,
            status: draft.status,
            price: draft.price,
            currency: draft.currency,
            location: draft.location,
            provenance: draft.provenance,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn validate(&self) -> TypeResult<()> {
        if self.id.is_empty() {
            return Err(TypeError::invalid("id", "must not be empty"));
        }
        non_empty("title", &self.title)?;
        non_empty("artist", &self.artist)?;
        non_empty("medium", &self.medium)?;
        non_empty("imageUrl", &self.image_url)?;
        self.dimensions.validate()?;
        check_price(self.price, self.currency.as_deref())?;
        if self.updated_at < self.created_at {
            return Err(TypeError::invalid("updatedAt", "precedes createdAt"));
        }
        Ok(())
    }

    /// Formatted price, if one is set.
    pub fn price_label(&self) -> Option<String> {
        self.price.map(|price| match &self.currency {
            Some(currency) => format!("{price:.2} {currency}"),
            None => format!("{price:.2}"),
        })
    }
}

/// Returns `true` for URLs served by the hosted blob store.
pub fn is_blob_url(url: &str) -> bool {
    url.contains("vercel-storage.com")
}

fn non_empty(field: &'static str, value: &str) -> TypeResult<()> {
    if value.trim().is_empty() {
        return Err(TypeError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> TypeResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TypeError::invalid(field, format!("must be positive, got {value}")));
    }
    Ok(())
}

fn check_price(price: Option<f64>, currency: Option<&str>) -> TypeResult<()> {
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            return Err(TypeError::invalid("price", format!("must be non-negative, got {price}")));
        }
    }
    if let Some(code) = currency {
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(TypeError::invalid(
                "currency",
                format!("expected a three-letter code, got {code:?}"),
            ));
        }
    }
    Ok(())
}
