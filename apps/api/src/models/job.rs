use serde::{Deserialize, Serialize};

/// A job posting as delivered by the scraping collaborator.
///
/// Scraping degrades gracefully: a selector that matched nothing arrives as
/// an absent field and defaults to the empty string, so a partially scraped
/// page still produces a usable run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}
