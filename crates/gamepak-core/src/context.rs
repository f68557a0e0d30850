//! The process context: game families, driver and factory registries.
//!
//! One [`ArchiveContext`] is built at startup, usually from a JSON
//! description of the families and games the application knows, and shared
//! as `Arc<ArchiveContext>` by every container. There is no global registry.
//!
//! ```json
//! {
//!   "families": [
//!     {
//!       "scheme": "quake",
//!       "name": "Quake",
//!       "root": "/games/quake",
//!       "default_game": "q1",
//!       "games": [
//!         { "id": "q1", "name": "Quake", "engine": "idtech1" },
//!         { "id": "q2", "name": "Quake II", "engine": "idtech2" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use walkdir::WalkDir;

use crate::Archive;
use crate::ArchiveBuilder;
use crate::ArchiveError;
use crate::Result;
use crate::address::ArchiveUri;
use crate::address::DEFAULT_SCHEME;
use crate::container::Container;
use crate::driver::FormatDriver;
use crate::driver::Listing;
use crate::export::filters::pattern_matches;
use crate::factory::ObjectFactory;
use crate::multi::MultiArchive;
use crate::registry::DriverRegistry;
use crate::registry::FactoryRegistry;

/// One game or edition; its engine keys driver and factory lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Identifier used as the `#contextId` of an address.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Engine identifier shared by related games.
    pub engine: String,
}

impl Game {
    /// Creates a game description.
    #[must_use]
    pub fn new(id: &str, name: &str, engine: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            engine: engine.to_string(),
        }
    }
}

/// A family of games addressed by one scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    /// Address scheme selecting this family.
    pub scheme: String,
    /// Display name.
    pub name: String,
    /// Directory container paths are relative to; absent means paths are
    /// used as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Games of the family.
    pub games: Vec<Game>,
    /// Game used when an address has no context id; the first game
    /// otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_game: Option<String>,
}

impl Family {
    /// Returns the game with `id`, or the default game for `None`.
    pub fn game(&self, id: Option<&str>) -> Option<&Game> {
        let id = id.or(self.default_game.as_deref());
        match id {
            Some(id) => self.games.iter().find(|game| game.id.eq_ignore_ascii_case(id)),
            None => self.games.first(),
        }
    }
}

/// Deserializable description of the known families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Known families; the first one is the default.
    pub families: Vec<Family>,
}

impl Default for ContextConfig {
    /// The `file` scheme with one `generic` game on the `generic` engine.
    fn default() -> Self {
        Self {
            families: vec![Family {
                scheme: DEFAULT_SCHEME.to_string(),
                name: "Local files".to_string(),
                root: None,
                games: vec![Game::new("generic", "Generic", "generic")],
                default_game: None,
            }],
        }
    }
}

impl ContextConfig {
    /// Checks that the description is usable.
    ///
    /// # Errors
    ///
    /// `Config` for an empty family list, a family without games, a
    /// default game that does not exist, or a scheme used twice.
    pub fn validate(&self) -> Result<()> {
        if self.families.is_empty() {
            return Err(ArchiveError::Config("no game families configured".into()));
        }
        let mut schemes: Vec<String> = Vec::with_capacity(self.families.len());
        for family in &self.families {
            let scheme = family.scheme.to_ascii_lowercase();
            if scheme.is_empty() {
                return Err(ArchiveError::Config(format!("family '{}' has no scheme", family.name)));
            }
            if schemes.contains(&scheme) {
                return Err(ArchiveError::Config(format!("scheme '{scheme}' configured twice")));
            }
            if family.games.is_empty() {
                return Err(ArchiveError::Config(format!("family '{scheme}' has no games")));
            }
            if family.game(None).is_none() {
                return Err(ArchiveError::Config(format!(
                    "default game of family '{scheme}' does not exist"
                )));
            }
            schemes.push(scheme);
        }
        Ok(())
    }
}

/// Families, drivers and factories for one process.
///
/// # Examples
///
/// ```
/// use gamepak_core::ArchiveContext;
///
/// let context = ArchiveContext::from_json(
///     r#"{"families": [{"scheme": "doom", "name": "Doom",
///         "games": [{"id": "doom2", "name": "Doom II", "engine": "idtech1"}]}]}"#,
/// )
/// .unwrap();
/// let uri = "doom:/doom2.wad".parse().unwrap();
/// let (family, game, path) = context.resolve(&uri).unwrap();
/// assert_eq!(family.name, "Doom");
/// assert_eq!(game.engine, "idtech1");
/// assert_eq!(path, std::path::PathBuf::from("/doom2.wad"));
/// ```
#[derive(Debug)]
pub struct ArchiveContext {
    families: Vec<Family>,
    default_game: Game,
    drivers: DriverRegistry,
    factories: FactoryRegistry,
}

impl ArchiveContext {
    /// Builds a context with the bundled drivers and no factories.
    ///
    /// # Errors
    ///
    /// `Config` if the description does not validate.
    pub fn new(config: ContextConfig) -> Result<Self> {
        config.validate()?;
        let default_game = config
            .families
            .first()
            .and_then(|family| family.game(None))
            .cloned()
            .ok_or_else(|| ArchiveError::Config("no default game".into()))?;
        Ok(Self {
            families: config.families,
            default_game,
            drivers: DriverRegistry::with_defaults(),
            factories: FactoryRegistry::new(),
        })
    }

    /// Builds a context from a JSON description.
    ///
    /// # Errors
    ///
    /// `Config` for malformed JSON or an invalid description.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ContextConfig = serde_json::from_str(json)
            .map_err(|e| ArchiveError::Config(format!("invalid context description: {e}")))?;
        Self::new(config)
    }

    /// Builds a context from a JSON file.
    ///
    /// # Errors
    ///
    /// I/O errors reading the file, plus everything [`Self::from_json`]
    /// reports.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Registers a driver for `(engine, extension)`.
    pub fn register_driver(
        &mut self,
        engine: &str,
        extension: &str,
        driver: Arc<dyn FormatDriver>,
    ) -> &mut Self {
        self.drivers.register(engine, extension, driver);
        self
    }

    /// Registers a factory for `(engine, extension)`.
    pub fn register_factory(
        &mut self,
        engine: &str,
        extension: &str,
        factory: Arc<dyn ObjectFactory>,
    ) -> &mut Self {
        self.factories.register(engine, extension, factory);
        self
    }

    /// Driver registry.
    #[inline]
    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    /// Mutable driver registry, for setup before sharing the context.
    pub fn drivers_mut(&mut self) -> &mut DriverRegistry {
        &mut self.drivers
    }

    /// Factory registry.
    #[inline]
    pub fn factories(&self) -> &FactoryRegistry {
        &self.factories
    }

    /// Configured families.
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Family selected by `scheme`.
    pub fn family(&self, scheme: &str) -> Option<&Family> {
        self.families
            .iter()
            .find(|family| family.scheme.eq_ignore_ascii_case(scheme))
    }

    /// Default game of the first family.
    pub fn default_game(&self) -> &Game {
        &self.default_game
    }

    /// Resolves an address to its family, game and backing location.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for an unknown scheme or context id.
    pub fn resolve(&self, uri: &ArchiveUri) -> Result<(&Family, &Game, PathBuf)> {
        let family = self.family(&uri.scheme).ok_or_else(|| {
            ArchiveError::InvalidAddress(format!("unknown scheme '{}'", uri.scheme))
        })?;
        let game = family.game(uri.context_id.as_deref()).ok_or_else(|| {
            ArchiveError::InvalidAddress(format!(
                "unknown context '{}' in family '{}'",
                uri.context_id.as_deref().unwrap_or_default(),
                family.scheme
            ))
        })?;
        let path = match &family.root {
            Some(root) => root.join(uri.container_path.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(&uri.container_path),
        };
        Ok((family, game, path))
    }

    /// Opens the container an address points at.
    ///
    /// A directory becomes a Many container over the files below it, a file
    /// name containing `*` becomes a Multi container over the matching
    /// sibling files, and anything else an Archive. Archives are returned
    /// opened; Multi members open on first use.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for a bad address, `NotFound` for a missing file or
    /// a pattern that matches nothing, plus any error opening the archive.
    pub fn open(self: &Arc<Self>, address: &str) -> Result<Container> {
        let uri: ArchiveUri = address.parse()?;
        let (_, game, path) = self.resolve(&uri)?;
        let game = game.clone();
        tracing::debug!(%uri, path = %path.display(), game = %game.id, "opening address");

        if path.is_dir() {
            let archive = self.build_many(&path, &game)?;
            archive.open()?;
            return Ok(Container::Archive(archive));
        }
        let is_pattern = path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name.contains('*'));
        if is_pattern {
            return self.build_multi(&path, &game).map(Container::Multi);
        }
        self.open_archive(&path, &game).map(Container::Archive)
    }

    /// Builds and opens an Archive over a file for `game`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the file is missing, plus any driver error.
    pub fn open_archive(self: &Arc<Self>, path: &Path, game: &Game) -> Result<Arc<Archive>> {
        let archive = self.build_archive(path, game)?;
        archive.open()?;
        Ok(archive)
    }

    /// Builds a closed Archive over a file for `game`.
    ///
    /// # Errors
    ///
    /// `Config` if the builder rejects the input.
    pub fn build_archive(self: &Arc<Self>, path: &Path, game: &Game) -> Result<Arc<Archive>> {
        ArchiveBuilder::new(Arc::clone(self))
            .file(path)
            .game(game.clone())
            .build()
    }

    /// Builds a closed Many container over every file below `root`.
    ///
    /// # Errors
    ///
    /// I/O errors walking the directory.
    pub fn build_many(self: &Arc<Self>, root: &Path, game: &Game) -> Result<Arc<Archive>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let logical: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            paths.push(logical.join("/"));
        }

        let name = root
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());
        tracing::debug!(root = %root.display(), files = paths.len(), "file listing collected");
        ArchiveBuilder::new(Arc::clone(self))
            .listing(
                &name,
                Listing {
                    root: root.to_path_buf(),
                    paths,
                },
            )
            .game(game.clone())
            .build()
    }

    /// Builds a Multi container over the files matching a `*` pattern.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches, I/O errors reading the directory.
    pub fn build_multi(self: &Arc<Self>, pattern_path: &Path, game: &Game) -> Result<MultiArchive> {
        let pattern = pattern_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = match pattern_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut matches: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if entry.file_type()?.is_file() && pattern_matches(&name.to_string_lossy(), &pattern) {
                matches.push(entry.path());
            }
        }
        if matches.is_empty() {
            return Err(ArchiveError::not_found(pattern_path.display().to_string()));
        }
        matches.sort();

        let members = matches
            .iter()
            .map(|path| self.build_archive(path, game))
            .collect::<Result<Vec<_>>>()?;
        Ok(MultiArchive::new(&pattern, members))
    }
}

impl Default for ArchiveContext {
    fn default() -> Self {
        Self {
            families: ContextConfig::default().families,
            default_game: Game::new("generic", "Generic", "generic"),
            drivers: DriverRegistry::with_defaults(),
            factories: FactoryRegistry::new(),
        }
    }
}
