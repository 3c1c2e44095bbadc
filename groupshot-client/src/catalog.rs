use async_trait::async_trait;
use groupshot_core::model::StickerAsset;

/// Boundary to the decorative-asset service. The session only needs a
/// list of named images to offer in the picker; where they come from
/// (remote emoji API, bundled pack) is the integrator's business.
#[async_trait]
pub trait StickerCatalog: Send + Sync {
    async fn fetch_assets(&self) -> anyhow::Result<Vec<StickerAsset>>;
}

/// Fixed in-memory catalog, enough for demos and tests.
pub struct StaticCatalog {
    assets: Vec<StickerAsset>,
}

impl StaticCatalog {
    pub fn new(assets: Vec<StickerAsset>) -> Self {
        Self { assets }
    }
}

#[async_trait]
impl StickerCatalog for StaticCatalog {
    async fn fetch_assets(&self) -> anyhow::Result<Vec<StickerAsset>> {
        Ok(self.assets.clone())
    }
}
