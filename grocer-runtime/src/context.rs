use std::sync::Arc;

use crate::{api::NotionApi, config::Config};

/// The one configured connection, built at startup and handed to every pass.
pub struct Context {
    api: Arc<dyn NotionApi>,
    pub config: Config,
}

impl Context {
    pub fn new(api: Arc<dyn NotionApi>, config: Config) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &dyn NotionApi {
        self.api.as_ref()
    }
}
