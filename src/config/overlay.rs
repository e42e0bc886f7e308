//! Current configuration overlaid on defaults, backed by a JSON file
//!
//! Construction: load defaults → ensure the backing file exists → load it.
//! If the file cannot be created or read the overlay is *broken*: it runs on
//! a copy of the defaults and stays fully usable.
//!
//! Not synchronized. Callers sharing one overlay across threads, or pointing
//! two overlays at the same file, must serialize access themselves.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::error::{ConfigError, LoadOutcome};
use super::source::{
    create_document, read_document, ConfigOrigin, ConfigSource, DefaultSource, Document,
};
use crate::diagnostics;
use crate::value::{convert_probe, Converter, ConverterRegistry, FromJson, JsonValue};

/// A JSON configuration file layered over default values
#[derive(Debug, Clone)]
pub struct ConfigOverlay {
    current: Map<String, Value>,
    defaults: Map<String, Value>,
    path: PathBuf,
    outcome: LoadOutcome,
    default_error: Option<Arc<ConfigError>>,
    sources: Vec<ConfigSource>,
}

impl ConfigOverlay {
    /// Open `path`, generating it from `defaults` if it does not exist.
    ///
    /// Never fails: problems are reported and reflected in
    /// [`is_broken`](Self::is_broken) and [`default_error`](Self::default_error).
    pub fn open(path: impl Into<PathBuf>, defaults: impl Into<DefaultSource>) -> Self {
        let path = path.into();
        let mut sources = Vec::new();

        let (defaults, default_error) = match defaults.into() {
            DefaultSource::File(default_path) => match read_document(&default_path) {
                Ok(Document { values, digest }) => {
                    sources.push(ConfigSource::file(ConfigOrigin::Default, &default_path, digest));
                    (values, None)
                }
                Err(source) => {
                    let err = ConfigError::DefaultLoad {
                        path: default_path,
                        source,
                    };
                    error!(error = %err, "default values unavailable");
                    (Map::new(), Some(Arc::new(err)))
                }
            },
            DefaultSource::Values(values) => {
                sources.push(ConfigSource::in_memory());
                (values, None)
            }
        };

        let template = default_error.is_none().then_some(&defaults);
        let (current, outcome) = match Self::establish(&path, template) {
            Ok((Document { values, digest }, outcome)) => {
                sources.push(ConfigSource::file(ConfigOrigin::Config, &path, digest));
                (values, outcome)
            }
            Err(err) => {
                error!(error = %err, "config is broken, falling back to default values");
                (defaults.clone(), LoadOutcome::Recovered(Arc::new(err)))
            }
        };

        Self {
            current,
            defaults,
            path,
            outcome,
            default_error,
            sources,
        }
    }

    /// Open `<dir>/<base_name>.json`
    pub fn in_dir(
        dir: impl AsRef<Path>,
        base_name: &str,
        defaults: impl Into<DefaultSource>,
    ) -> Self {
        Self::open(dir.as_ref().join(format!("{}.json", base_name)), defaults)
    }

    /// Open `path` with defaults read from a JSON file
    pub fn with_default_file(path: impl Into<PathBuf>, default_file: impl Into<PathBuf>) -> Self {
        Self::open(path, DefaultSource::File(default_file.into()))
    }

    /// Open `path` with defaults supplied directly
    pub fn with_default_values(path: impl Into<PathBuf>, defaults: Map<String, Value>) -> Self {
        Self::open(path, DefaultSource::Values(defaults))
    }

    /// Make sure the backing file exists, then read it
    fn establish(
        path: &Path,
        template: Option<&Map<String, Value>>,
    ) -> Result<(Document, LoadOutcome), ConfigError> {
        let mut outcome = LoadOutcome::Loaded;

        if !path.exists() {
            let template = template.ok_or_else(|| ConfigError::MissingDefaults {
                path: path.to_path_buf(),
            })?;
            create_document(path, template).map_err(|source| ConfigError::Create {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "generated config file from defaults");
            outcome = LoadOutcome::Created;
        }

        let document = read_document(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((document, outcome))
    }

    /// Raw value from the current configuration
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    /// Raw value from the current configuration, or `default`
    pub fn get_raw_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get_raw(key).unwrap_or(default)
    }

    /// Raw value from the current configuration, or from the defaults
    pub fn get_raw_or_default(&self, key: &str) -> Option<&Value> {
        self.get_raw(key).or_else(|| self.get_raw_from_default(key))
    }

    /// Raw value from the defaults
    pub fn get_raw_from_default(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    /// Value from the current configuration; absent if the key is missing
    pub fn get(&self, key: &str) -> JsonValue {
        self.get_raw(key).cloned().into()
    }

    /// Value from the current configuration, or `default`
    pub fn get_or(&self, key: &str, default: impl Into<JsonValue>) -> JsonValue {
        match self.get_raw(key) {
            Some(raw) => JsonValue::new(raw.clone()),
            None => default.into(),
        }
    }

    /// Value from the current configuration, or from the defaults
    pub fn get_or_default(&self, key: &str) -> JsonValue {
        self.get_raw_or_default(key).cloned().into()
    }

    /// Value from the defaults
    pub fn get_from_default(&self, key: &str) -> JsonValue {
        self.get_raw_from_default(key).cloned().into()
    }

    /// Current value decoded as the type of `fallback`, or `fallback`.
    ///
    /// Only the current configuration is consulted.
    pub fn get_as<T: FromJson>(&self, key: &str, fallback: T) -> T {
        convert_probe(self.get_raw(key), fallback)
    }

    /// Current value decoded with `converter`.
    ///
    /// If the current value is missing or does not decode, the default value
    /// for the same key is decoded instead.
    pub fn get_as_with<C: Converter>(&self, key: &str, converter: &C) -> Option<C::Target> {
        converter
            .try_convert(self.get_raw(key))
            .or_else(|| converter.try_convert(self.get_raw_from_default(key)))
    }

    /// Current value decoded by the first converter in `registry` producing
    /// the type of `fallback`, or `fallback`
    pub fn get_as_registered<T: 'static>(
        &self,
        key: &str,
        fallback: T,
        registry: &ConverterRegistry,
    ) -> T {
        registry.convert_probe(self.get_raw(key), fallback)
    }

    /// Insert or replace `key` in memory only; call [`save`](Self::save) to persist.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.current.insert(key.into(), value.into());
        debug!("config updated in memory, call save() to write it to disk");
    }

    /// Insert or replace every entry in memory only; call [`save`](Self::save)
    /// to persist.
    pub fn put_all<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.current.extend(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        debug!("config updated in memory, call save() to write it to disk");
    }

    /// [`put`](Self::put) followed by [`save`](Self::save)
    pub fn put_and_save(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        self.put(key, value);
        self.save()
    }

    /// [`put_all`](Self::put_all) followed by [`save`](Self::save)
    pub fn put_all_and_save<I, K, V>(&mut self, entries: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.put_all(entries);
        self.save()
    }

    /// Write the current configuration to the backing file.
    ///
    /// Returns `false` (after reporting) if the file could not be written;
    /// the in-memory values are untouched either way.
    pub fn save(&mut self) -> bool {
        match self.try_save() {
            Ok(()) => {
                debug!(path = %self.path.display(), "saved config to file");
                true
            }
            Err(err) => {
                error!(error = %err, "unable to save config");
                false
            }
        }
    }

    /// Replace the backing file with the current configuration, keys in
    /// insertion order
    pub fn try_save(&mut self) -> Result<(), ConfigError> {
        debug!(path = %self.path.display(), "saving config to file");
        diagnostics::suppressed(|| self.delete());

        let digest =
            create_document(&self.path, &self.current).map_err(|source| ConfigError::Save {
                path: self.path.clone(),
                source,
            })?;
        self.forget_config_source();
        self.sources
            .push(ConfigSource::file(ConfigOrigin::Config, &self.path, digest));
        Ok(())
    }

    /// Delete the backing file, reporting a warning either way.
    ///
    /// In-memory values are kept. Returns `false` if there was nothing to
    /// delete or the removal failed.
    pub fn delete(&mut self) -> bool {
        match self.try_delete() {
            Ok(()) => {
                warn!(
                    path = %self.path.display(),
                    "config file was deleted, restart the application to regenerate it"
                );
                true
            }
            Err(err @ ConfigError::AlreadyDeleted { .. }) => {
                warn!(error = %err, "nothing to delete");
                false
            }
            Err(err) => {
                error!(error = %err, "unable to delete config file");
                false
            }
        }
    }

    /// Delete the backing file without reporting.
    ///
    /// Fails with [`ConfigError::AlreadyDeleted`] if there is no file.
    pub fn try_delete(&mut self) -> Result<(), ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::AlreadyDeleted {
                path: self.path.clone(),
            });
        }
        fs::remove_file(&self.path).map_err(|source| ConfigError::Delete {
            path: self.path.clone(),
            source,
        })?;
        self.forget_config_source();
        Ok(())
    }

    fn forget_config_source(&mut self) {
        self.sources
            .retain(|source| source.origin != ConfigOrigin::Config);
    }

    /// Independent copy sharing the backing file path and the broken flag
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Copy of the current configuration
    pub fn snapshot_current(&self) -> Map<String, Value> {
        self.current.clone()
    }

    /// Copy of the default configuration
    pub fn snapshot_default(&self) -> Map<String, Value> {
        self.defaults.clone()
    }

    /// Whether the backing file could not be established and defaults were
    /// substituted
    pub fn is_broken(&self) -> bool {
        self.outcome.is_broken()
    }

    /// How the backing file was established at construction
    pub fn outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    /// Why the default values could not be loaded, if they could not
    pub fn default_error(&self) -> Option<&ConfigError> {
        self.default_error.as_deref()
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the defaults came from, plus the backing file as last read or
    /// written. The backing file entry is dropped when the file is deleted.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }
}
