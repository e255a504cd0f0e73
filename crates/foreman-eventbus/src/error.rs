// SPDX-License-Identifier: MIT

use foreman_core::ProjectSlug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("store error: {0}")]
    Store(#[from] foreman_storage::StoreError),

    #[error("no subscriber {0:?} for project {1:?}")]
    UnknownSubscriber(u64, ProjectSlug),
}
