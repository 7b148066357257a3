use m3_mod_core::{Game, ModDescriptor};
use std::collections::BTreeSet;
use std::sync::Arc;

/// The ordered list of mods packed into one archive.
///
/// Immutable once built. The multipack and game prefix flags are derived from
/// the mod list when the set is created.
#[derive(Clone)]
pub struct DeploymentSet {
    mods: Vec<Arc<dyn ModDescriptor>>,
    is_multi_pack: bool,
    needs_game_prefix: bool,
}

impl DeploymentSet {
    pub fn new(mods: Vec<Arc<dyn ModDescriptor>>) -> Self {
        let games: BTreeSet<Game> = mods.iter().map(|m| m.game()).collect();
        Self {
            is_multi_pack: mods.len() > 1,
            needs_game_prefix: games.len() > 1,
            mods,
        }
    }

    pub fn mods(&self) -> &[Arc<dyn ModDescriptor>] {
        &self.mods
    }

    /// More than one mod: every mod goes below a folder named after it.
    pub fn is_multi_pack(&self) -> bool {
        self.is_multi_pack
    }

    /// More than one distinct game: every path goes below a `{Game}` folder.
    pub fn needs_game_prefix(&self) -> bool {
        self.needs_game_prefix
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}

impl std::fmt::Debug for DeploymentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentSet")
            .field(
                "mods",
                &self.mods.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("is_multi_pack", &self.is_multi_pack)
            .field("needs_game_prefix", &self.needs_game_prefix)
            .finish()
    }
}
