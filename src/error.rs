/// Result type for setup-time operations (settings, textures, pools, binding).
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors from setting up the pipeline. Per-frame stages never fail.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    SettingsParse(#[from] ron::error::SpannedError),

    #[error("settings serialize error: {0}")]
    SettingsSerialize(#[from] ron::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    /// Invalid caller-provided configuration or attachment layout.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
