//! Landing page aggregate.

use serde::{Deserialize, Serialize};

use stealth_core::CategoryId;

/// A browsable category tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The promotional card at the top of the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroCard {
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Where tapping the card leads (a category or product reference).
    #[serde(default)]
    pub link_to: Option<String>,
}

/// Response of `GET /home`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeScreenData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub hero_card: Option<HeroCard>,
}
