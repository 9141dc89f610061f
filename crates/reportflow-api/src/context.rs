/// API Context - shared state for all API handlers
use reportflow_core::DispatchPipeline;
use reportflow_core::models::ReportflowConfig;
use reportflow_core::services::EnvConfigProvider;
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<DispatchPipeline>,
}

impl ApiContext {
    pub fn new(pipeline: DispatchPipeline) -> Arc<Self> {
        Arc::new(Self {
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn from_config(config: &ReportflowConfig) -> anyhow::Result<Arc<Self>> {
        Ok(Self::new(DispatchPipeline::from_config(config)?))
    }

    /// Loads configuration from the environment and wires the pipeline
    pub fn from_env() -> anyhow::Result<Arc<Self>> {
        let config = EnvConfigProvider::new()?.into_config();
        Self::from_config(&config)
    }
}
