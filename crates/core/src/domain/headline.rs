use serde::{Deserialize, Serialize};

/// Most headlines a single page ever shows.
pub const MAX_HEADLINES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
}
