//! Catch-all events that don't belong to a single pipeline stage

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GeneralEvent {
    Warning { message: String },
    Error { message: String },
    Cancelled { scope: String },
}
