use std::{fs, io, path::PathBuf};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::player_models::LevelModel;

const LEVELS_FILE: &str = "levels.json";

lazy_static! {
    static ref DEFAULT_TIERS: Vec<LevelTier> = [
        (1, 0, "Novice"),
        (2, 100, "Apprentice"),
        (3, 300, "Adept"),
        (4, 600, "Expert"),
        (5, 1000, "Master"),
        (6, 2000, "Grandmaster"),
        (7, 3500, "Legend"),
        (8, 5500, "Mythic"),
        (9, 8000, "Immortal"),
        (10, 12000, "Eternal"),
    ]
    .iter()
    .map(|&(level, xp_required, title)| LevelTier { level, xp_required, title: title.to_string() })
    .collect();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelTier {
    pub level: u32,
    pub xp_required: i64,
    pub title: String,
}

#[derive(Debug, Error)]
pub enum LevelTableError {
    #[error("The level table must contain at least one tier")]
    Empty,
    #[error("Could not read the level table: {0}")]
    Io(#[from] io::Error),
    #[error("Could not parse the level table: {0}")]
    Parse(#[from] serde_json::Error),
}

///
/// Ordered table of level tiers. Always holds at least one tier,
/// sorted ascending by `xp_required`.
///
#[derive(Debug, Clone)]
pub struct LevelTable {
    tiers: Vec<LevelTier>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self { tiers: DEFAULT_TIERS.clone() }
    }
}

impl LevelTable {
    pub fn new(mut tiers: Vec<LevelTier>) -> Result<Self, LevelTableError> {
        if tiers.is_empty() {
            return Err(LevelTableError::Empty);
        }
        tiers.sort_by_key(|tier| tier.xp_required);
        Ok(Self { tiers })
    }

    ///
    /// Loads `levels.json` from the given resources folder. Falls back to
    /// the built-in table if the file does not exist.
    ///
    pub fn load(folder_path: &str) -> Result<Self, LevelTableError> {
        let mut path = PathBuf::from(folder_path);
        path.push(LEVELS_FILE);

        match fs::read_to_string(path) {
            Ok(contents) => Self::new(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn tiers(&self) -> &[LevelTier] {
        &self.tiers
    }

    ///
    /// Returns the highest tier whose threshold does not exceed `xp`.
    /// Scans from the top tier down; xp below every threshold lands on
    /// the first tier.
    ///
    pub fn tier_for_xp(&self, xp: i64) -> &LevelTier {
        &self.tiers[self.tier_idx(xp)]
    }

    pub fn next_tier(&self, xp: i64) -> Option<&LevelTier> {
        self.tiers.get(self.tier_idx(xp) + 1)
    }

    /// Threshold of the top tier. Used as the xp cap.
    pub fn max_xp(&self) -> i64 {
        self.tiers[self.tiers.len() - 1].xp_required
    }

    ///
    /// Percentage of the way from the current tier's threshold to the
    /// next one, clamped to `[0, 100]`. Always `100` at the top tier.
    ///
    pub fn progress(&self, xp: i64) -> f64 {
        let current = self.tier_for_xp(xp);
        match self.next_tier(xp) {
            None => 100.0,
            Some(next) => {
                let span = (next.xp_required - current.xp_required) as f64;
                let pct = (xp - current.xp_required) as f64 / span * 100.0;
                pct.clamp(0.0, 100.0)
            }
        }
    }

    pub fn level_of(&self, xp: i64) -> LevelModel {
        let tier = self.tier_for_xp(xp);
        LevelModel {
            level: tier.level,
            title: tier.title.clone(),
            progress: self.progress(xp),
        }
    }

    fn tier_idx(&self, xp: i64) -> usize {
        self.tiers
            .iter()
            .rposition(|tier| tier.xp_required <= xp)
            .unwrap_or(0)
    }
}
