#![allow(clippy::module_name_repetitions)]
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::song::SongId;

pub const TABLE_NAME: &str = "settings";

/// Owner-level catalog configuration.
///
/// Keyed directly by the owner uid (`settings:⟨uid⟩`); last writer wins.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Uid of the streamer these settings belong to. Redundant with the
    /// record key, kept so change notifications can be routed per owner.
    #[serde(default)]
    pub owner: String,
    /// Category names offered in the song editor and as filter chips.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Tags the owner wants offered as one-click suggestions.
    #[serde(default = "default_custom_tags")]
    pub custom_tags: Vec<String>,
    /// Display color per tag, css-color-ish strings.
    #[serde(default)]
    pub tag_colors: BTreeMap<String, String>,
    /// Named tag subsets driving the "mood" filter facet.
    #[serde(default)]
    pub tag_groups: Vec<TagGroup>,
    /// Request submissions containing any of these are refused.
    #[serde(default)]
    pub ng_keywords: Vec<String>,
    /// Blocked requester uids, with a label for the owner's reference.
    #[serde(default)]
    pub ng_users: BTreeMap<String, String>,
    /// Saved setlists that can be loaded back onto the working flags.
    #[serde(default)]
    pub setlist_presets: Vec<SetlistPreset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            categories: default_categories(),
            custom_tags: default_custom_tags(),
            tag_colors: BTreeMap::new(),
            tag_groups: Vec::new(),
            ng_keywords: Vec::new(),
            ng_users: BTreeMap::new(),
            setlist_presets: Vec::new(),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn is_blocked(&self, uid: &str) -> bool {
        self.ng_users.contains_key(uid)
    }

    /// Look up a tag group by name.
    #[must_use]
    pub fn tag_group(&self, name: &str) -> Option<&TagGroup> {
        self.tag_groups.iter().find(|g| g.name == name)
    }

    /// Look up a setlist preset by name.
    #[must_use]
    pub fn setlist_preset(&self, name: &str) -> Option<&SetlistPreset> {
        self.setlist_presets.iter().find(|p| p.name == name)
    }
}

fn default_categories() -> Vec<String> {
    ["J-POP", "Rock", "Anime", "K-POP", "Vocaloid", "Other"]
        .map(String::from)
        .to_vec()
}

fn default_custom_tags() -> Vec<String> {
    [
        "First-timers welcome",
        "Practicing",
        "Ballad",
        "Hype",
        "Acoustic",
    ]
    .map(String::from)
    .to_vec()
}

/// A named, owner-defined subset of tags ("moods") used as an alternate
/// filter facet on the public page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagGroup {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A saved setlist: loading one overwrites the working `is_setlist` flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SetlistPreset {
    pub name: String,
    #[serde(default)]
    pub song_ids: Vec<SongId>,
}
