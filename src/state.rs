use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::api::HttpRecipeApi;
use crate::config::Config;
use crate::images::ImageCache;
use crate::mirror::{LocalMirror, MirrorWriter};
use crate::session::SessionStore;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Everything a command needs, built once at startup.
#[derive(Clone)]
pub struct ClientState {
    pub db: DbPool,
    pub config: Config,
    pub api: Arc<HttpRecipeApi>,
    pub session: SessionStore,
    pub mirror: LocalMirror,
    pub writer: MirrorWriter,
    pub images: Arc<ImageCache<HttpRecipeApi>>,
}

impl ClientState {
    /// Must be called inside a tokio runtime; spawns the mirror writer.
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let session = SessionStore::new(db.clone());
        let api = Arc::new(HttpRecipeApi::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
            Arc::new(session.clone()),
        )?);
        let mirror = LocalMirror::new(db.clone());
        let writer = MirrorWriter::spawn(mirror.clone());
        let images = Arc::new(ImageCache::new(api.clone(), config.images.cache_bytes));

        Ok(Self {
            db,
            config,
            api,
            session,
            mirror,
            writer,
            images,
        })
    }
}
