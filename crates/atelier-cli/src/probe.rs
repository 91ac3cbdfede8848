//! Add/update/remove round trip against an in-process backend.

use atelier_collection::PieceCollection;
use atelier_store::{BackendFactory, BackendKind, Collaborators, StoreConfig};
use atelier_types::{ArtPiecePatch, Dimensions, NewArtPiece, PieceStatus, Unit};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct ProbeCheck {
    pub name: &'static str,
    pub passed: bool,
}

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub backend: BackendKind,
    pub checks: Vec<ProbeCheck>,
}

impl ProbeReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    fn check(&mut self, name: &'static str, passed: bool) {
        debug!(check = name, passed, "probe check");
        self.checks.push(ProbeCheck { name, passed });
    }
}

/// Run the round trip on in-memory clients for `backend`.
pub async fn run_probe(backend: BackendKind, base: &StoreConfig) -> anyhow::Result<ProbeReport> {
    let config = StoreConfig {
        backend,
        fallback_to_local: false,
        ..base.clone()
    };
    let store = BackendFactory::open(&config, &Collaborators::in_memory()).await?;
    let collection = PieceCollection::new(store, None);
    collection.refresh().await;

    let mut report = ProbeReport {
        backend,
        checks: Vec::new(),
    };

    let draft = NewArtPiece::new(
        "A",
        "B",
        2024,
        Dimensions::flat(10.0, 10.0, Unit::Cm),
        "Oil",
        "http://x/1.jpg",
    );
    let created = collection.add(draft).await?;
    report.check("add assigns an id", !created.id.is_empty());
    report.check("add keeps status", created.status == PieceStatus::Available);
    report.check("add sets equal timestamps", created.created_at == created.updated_at);

    let updated = collection
        .update_piece(
            &created.id,
            ArtPiecePatch::status(PieceStatus::Sold).with_price(100.0, None),
        )
        .await?;
    report.check("update applies status", updated.status == PieceStatus::Sold);
    report.check("update applies price", updated.price == Some(100.0));
    report.check("update keeps identity", updated.id == created.id);
    report.check("update keeps created_at", updated.created_at == created.created_at);
    report.check("update advances updated_at", updated.updated_at > updated.created_at);

    collection.remove(&created.id).await?;
    report.check(
        "remove makes read absent",
        collection.get_by_id(&created.id).await.is_none(),
    );
    report.check(
        "remove drops from read_all",
        collection
            .backend()
            .read_all()
            .await
            .iter()
            .all(|p| p.id != created.id),
    );
    report.check(
        "second remove succeeds",
        collection.remove(&created.id).await.is_ok(),
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_backend_passes() {
        for backend in [BackendKind::Local, BackendKind::Document, BackendKind::KeyValue] {
            let report = run_probe(backend, &StoreConfig::default()).await.unwrap();
            assert_eq!(report.backend, backend);
            assert!(report.passed(), "{backend}: {:?}", report.checks);
            assert_eq!(report.checks.len(), 11);
        }
    }

    #[tokio::test]
    async fn report_serializes() {
        let report = run_probe(BackendKind::Document, &StoreConfig::default())
            .await
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["backend"], "document");
        assert_eq!(json["checks"][0]["passed"], true);
    }
}
