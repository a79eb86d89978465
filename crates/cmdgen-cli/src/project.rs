use anyhow::Context;
use cmdgen_core::{
    catalog::Catalog,
    config::Config,
    guidance::{GuidanceContext, Recommender},
    store::FileStore,
};
use std::path::{Path, PathBuf};

/// Everything a command needs from an initialized project directory.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub catalog: Catalog,
    pub store: FileStore,
}

impl Project {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let catalog_path = config.catalog_path(root);
        let catalog = Catalog::load(&catalog_path)
            .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
        let store = FileStore::new(config.store_dir(root));
        tracing::debug!(
            commands = catalog.commands.len(),
            workflows = catalog.workflows.len(),
            "project opened"
        );
        Ok(Self {
            root: root.to_path_buf(),
            config,
            catalog,
            store,
        })
    }

    pub fn recommender(&self) -> Recommender {
        Recommender::with_extra(&self.config.guidance.overrides)
    }

    /// Guidance context for `--workflow`. A catalog workflow id maps to its
    /// title; anything else is taken as a free-form template title.
    pub fn guidance_context(&self, workflow: &str) -> GuidanceContext {
        match self.catalog.workflow(workflow) {
            Some(wf) => GuidanceContext::workflow(wf.title()),
            None => GuidanceContext::workflow(workflow),
        }
    }
}
