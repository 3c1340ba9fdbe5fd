use camwatch_core::CoreError;
use camwatch_fetch::FetchError;
use camwatch_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Unknown camera: {0}")]
    UnknownCamera(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
