//! File-backed store: one JSON document per stored value.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rowmap_core::{BackingStore, FieldPath, OpenCallback, SelectionFilter, StoreError, Value};
use rowmap_serde::{json_to_value, value_to_json};

use crate::identity::{default_identity, ensure_identity};
use crate::open_state::OpenFlag;

const EXTENSION: &str = "json";

/// A value written to its tmp file, waiting to be renamed into place.
struct Staged {
    tmp: PathBuf,
    path: PathBuf,
}

impl Staged {
    fn commit(self) -> Result<(), StoreError> {
        fs::rename(&self.tmp, &self.path)?;
        Ok(())
    }
}

/// A backing store that keeps each value as `<root>/<identity>.json`.
///
/// The root directory is created (if needed) and checked when the store is
/// opened, which happens on a background thread; until then every operation
/// fails with `NotOpen`. Reads return values ordered by file name.
///
/// Identities are escaped into file names: characters outside
/// `[A-Za-z0-9_-]` become `%XX` byte escapes.
#[derive(Debug)]
pub struct LocalJsonStore {
    root: PathBuf,
    identity: FieldPath,
    open: OpenFlag,
    writes: Mutex<()>,
}

impl LocalJsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            identity: default_identity(),
            open: OpenFlag::default(),
            writes: Mutex::new(()),
        }
    }

    /// Use `identity` instead of `id` as the identity field.
    #[must_use]
    pub fn with_identity(mut self, identity: FieldPath) -> Self {
        self.identity = identity;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn prepare_root(root: &Path) -> Result<(), StoreError> {
        fs::create_dir_all(root).map_err(|e| StoreError::OpenFailed {
            message: format!("cannot create {}: {}", root.display(), e),
        })?;

        let attr = fs::metadata(root)?;
        if !attr.is_dir() {
            return Err(StoreError::OpenFailed {
                message: format!("{} is not a directory", root.display()),
            });
        }
        if attr.permissions().readonly() {
            return Err(StoreError::OpenFailed {
                message: format!("{} is not writable", root.display()),
            });
        }
        Ok(())
    }

    fn file_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", escape_file_name(id), EXTENSION))
    }

    fn write_value(&self, id: &str, value: &Value) -> Result<(), StoreError> {
        let staged = self.stage(id, value)?;
        staged.commit()
    }

    /// Write `value` next to its final file, without making it visible.
    fn stage(&self, id: &str, value: &Value) -> Result<Staged, StoreError> {
        let path = self.file_path(id);
        let tmp = path.with_extension("tmp");
        tracing::debug!(path = %path.display(), "writing value");

        let text = serde_json::to_vec_pretty(&value_to_json(value)).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;

        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(&text)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(Staged { tmp, path })
    }

    fn read_values(&self) -> Result<Vec<Value>, StoreError> {
        self.open.check()?;

        let mut values = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StoreError::Io(io::Error::other(e)))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION)
            {
                continue;
            }

            tracing::trace!(path = %path.display(), "reading value");
            let bytes = fs::read(path)?;
            let json: serde_json::Value =
                serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
                    message: format!("{}: {}", path.display(), e),
                })?;
            values.push(json_to_value(json));
        }
        Ok(values)
    }

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.writes.lock().map_err(|_| StoreError::Other {
            message: "local store lock poisoned".to_string(),
        })
    }
}

fn escape_file_name(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{:02X}", byte));
        }
    }
    escaped
}

impl BackingStore for LocalJsonStore {
    fn save(&self, mut value: Value) -> Result<(), StoreError> {
        self.open.check()?;
        let id = ensure_identity(&self.identity, &mut value)?;
        let _guard = self.lock_writes()?;
        self.write_value(&id, &value)
    }

    fn save_all(&self, values: Vec<Value>) -> Result<(), StoreError> {
        self.open.check()?;
        let mut identified = Vec::with_capacity(values.len());
        for mut value in values {
            let id = ensure_identity(&self.identity, &mut value)?;
            identified.push((id, value));
        }

        // Stage every file before renaming any, so a failed write leaves
        // the directory as it was
        let _guard = self.lock_writes()?;
        let mut staged: Vec<Staged> = Vec::with_capacity(identified.len());
        for (id, value) in &identified {
            match self.stage(id, value) {
                // A later value with the same identity rewrote the same tmp file
                Ok(file) if staged.iter().any(|s| s.path == file.path) => {}
                Ok(file) => staged.push(file),
                Err(e) => {
                    for file in &staged {
                        let _ = fs::remove_file(&file.tmp);
                    }
                    return Err(e);
                }
            }
        }

        staged.into_iter().try_for_each(Staged::commit)
    }

    fn read_all(&self) -> Result<Vec<Value>, StoreError> {
        self.read_values()
    }

    fn read_with_filter(&self, filter: &SelectionFilter) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .read_values()?
            .into_iter()
            .filter(|value| filter.matches(value))
            .collect())
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.open.check()?;
        let _guard = self.lock_writes()?;
        match fs::remove_file(self.file_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.open.check()?;
        let _guard = self.lock_writes()?;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION) {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn identity_field(&self) -> Option<FieldPath> {
        Some(self.identity.clone())
    }

    fn opens_asynchronously(&self) -> bool {
        true
    }

    fn open(&self, on_complete: OpenCallback) {
        let root = self.root.clone();
        self.open
            .open_in_background("local", move || Self::prepare_root(&root), on_complete);
    }
}
