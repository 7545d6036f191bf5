//! Terrain and script registries loaded from TOML rulesets

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{GenError, Result};
use crate::generator::script::MapScript;
use crate::terrain::block::MapBlock;
use crate::terrain::objects::{ObjectSet, SeamSpec};

/// A named collection of map blocks, object sets, and a layout script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    pub name: String,
    /// Name of the map script that lays this terrain out
    pub script: String,
    #[serde(default)]
    pub blocks: Vec<MapBlock>,
    #[serde(default)]
    pub object_sets: Vec<ObjectSet>,
    /// Seam drilling declaration, if this terrain supports tunnels
    #[serde(default)]
    pub seam: Option<SeamSpec>,
}

impl Terrain {
    pub fn block(&self, name: &str) -> Option<&MapBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// All blocks passing the given group/name filters
    pub fn blocks_matching(&self, groups: &[i32], names: &[String]) -> Vec<&MapBlock> {
        self.blocks
            .iter()
            .filter(|b| b.matches(groups, names))
            .collect()
    }

    /// Total number of terrain objects across all sets, in load order
    pub fn object_count(&self) -> usize {
        self.object_sets.iter().map(|s| s.objects.len()).sum()
    }
}

/// Registry of terrains and map scripts for one game ruleset
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    terrains: AHashMap<String, Terrain>,
    scripts: AHashMap<String, MapScript>,
}

#[derive(Debug, Deserialize)]
struct RulesetDef {
    #[serde(default)]
    terrains: Vec<Terrain>,
    #[serde(default)]
    scripts: Vec<MapScript>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML ruleset document
    pub fn from_toml(text: &str) -> Result<Self> {
        let def: RulesetDef = toml::from_str(text)?;
        let mut ruleset = Self::new();
        for terrain in def.terrains {
            ruleset.add_terrain(terrain);
        }
        for script in def.scripts {
            ruleset.add_script(script);
        }
        Ok(ruleset)
    }

    /// Load and merge every `.toml` file in a directory
    pub fn load_dir(path: &std::path::Path) -> Result<Self> {
        let mut ruleset = Self::new();
        let mut entries: Vec<_> = std::fs::read_dir(path)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        entries.sort();
        for entry in entries {
            let text = std::fs::read_to_string(&entry)?;
            let def: RulesetDef = toml::from_str(&text)?;
            for terrain in def.terrains {
                ruleset.add_terrain(terrain);
            }
            for script in def.scripts {
                ruleset.add_script(script);
            }
        }
        Ok(ruleset)
    }

    pub fn add_terrain(&mut self, terrain: Terrain) {
        self.terrains.insert(terrain.name.clone(), terrain);
    }

    pub fn add_script(&mut self, script: MapScript) {
        self.scripts.insert(script.name.clone(), script);
    }

    pub fn terrain(&self, name: &str) -> Result<&Terrain> {
        self.terrains
            .get(name)
            .ok_or_else(|| GenError::TerrainNotFound(name.to_string()))
    }

    pub fn script(&self, name: &str) -> Result<&MapScript> {
        self.scripts
            .get(name)
            .ok_or_else(|| GenError::ScriptNotFound(name.to_string()))
    }
}
