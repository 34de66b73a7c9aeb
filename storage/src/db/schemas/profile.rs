#![allow(clippy::module_name_repetitions)]
use serde::{Deserialize, Serialize};

pub const TABLE_NAME: &str = "profile";

/// Owner-level display configuration for the public page.
///
/// Keyed directly by the owner uid (`profile:⟨uid⟩`); last writer wins, no
/// invariants beyond that.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Uid of the streamer this profile belongs to. Redundant with the record
    /// key, kept so change notifications can be routed per owner.
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub youtube: String,
    #[serde(default)]
    pub twitch: String,
    #[serde(default)]
    pub tiktok: String,
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub background_image: String,
    /// One-line notice shown above the public catalog.
    #[serde(default)]
    pub announcement: String,
    /// Gate for the whole request feature on the public page.
    #[serde(default = "default_true")]
    pub is_request_enabled: bool,
    /// Gate for the gacha draw on the public page.
    #[serde(default = "default_true")]
    pub is_gacha_enabled: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            owner: String::new(),
            display_name: String::new(),
            bio: String::new(),
            avatar_url: String::new(),
            twitter: String::new(),
            youtube: String::new(),
            twitch: String::new(),
            tiktok: String::new(),
            theme_color: default_theme_color(),
            font_family: default_font_family(),
            background_image: String::new(),
            announcement: String::new(),
            is_request_enabled: true,
            is_gacha_enabled: true,
        }
    }
}

fn default_theme_color() -> String {
    "blue".to_string()
}

fn default_font_family() -> String {
    "sans".to_string()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_record_defaults_to_requests_enabled() {
        let profile: Profile = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(profile.is_request_enabled);
        assert!(profile.is_gacha_enabled);
        assert_eq!(profile.theme_color, "blue");
        assert_eq!(profile.font_family, "sans");
        assert_eq!(profile, Profile::default());
    }
}
