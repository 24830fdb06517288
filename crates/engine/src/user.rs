//! User record and its storage.
//!
//! The store is a single JSON table file written through [`FilesystemOps`].

use crate::traits::{CapError, FilesystemOps};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl User {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: None,
            profile_picture: None,
            is_admin: None,
            display_name: None,
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} already exists")]
    Duplicate(Uuid),
    #[error("user {0} not found")]
    NotFound(Uuid),
    #[error("corrupt user table: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error(transparent)]
    Cap(#[from] CapError),
}

pub trait UserStore: Send + Sync {
    /// Create the backing table if it does not exist yet.
    fn sync(&self) -> Result<(), StoreError>;
    fn insert(&self, user: User) -> Result<User, StoreError>;
    fn get(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    fn update(&self, user: User) -> Result<User, StoreError>;
    fn list(&self) -> Result<Vec<User>, StoreError>;
}

pub struct JsonUserStore {
    fs: Arc<dyn FilesystemOps>,
    path: PathBuf,
}

impl JsonUserStore {
    pub fn new(fs: Arc<dyn FilesystemOps>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<User>, StoreError> {
        if !self.fs.exists(&self.path) {
            return Ok(Vec::new());
        }
        let data = self.fs.read_file(&self.path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Written beside the table and renamed over it, so readers see either
    /// the old table or the new one.
    fn save(&self, users: &[User]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(users)?;
        let scratch = self.scratch_path();
        self.fs.write_file(&scratch, &data)?;
        self.fs.rename(&scratch, &self.path)?;
        Ok(())
    }
}

impl UserStore for JsonUserStore {
    fn sync(&self) -> Result<(), StoreError> {
        if !self.fs.exists(&self.path) {
            tracing::debug!(path = %self.path.display(), "creating user table");
            self.save(&[])?;
        }
        Ok(())
    }

    fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.load()?;
        if users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::Duplicate(user.id));
        }
        users.push(user.clone());
        self.save(&users)?;
        Ok(user)
    }

    fn get(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.load()?.into_iter().find(|u| u.id == id))
    }

    fn update(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.load()?;
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound(user.id))?;
        *slot = user.clone();
        self.save(&users)?;
        Ok(user)
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StdFilesystem;
    use crate::traits::CapResult;

    fn temp_store() -> (JsonUserStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("webwrap_users_{}", Uuid::new_v4()));
        let store = JsonUserStore::new(Arc::new(StdFilesystem), dir.join("users.json"));
        (store, dir)
    }

    #[test]
    fn test_sync_creates_empty_table() {
        let (store, dir) = temp_store();
        store.sync().unwrap();
        assert!(store.path().exists());
        assert!(store.list().unwrap().is_empty());
        // Second sync leaves existing rows alone.
        store.insert(User::new()).unwrap();
        store.sync().unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_insert_get_update() {
        let (store, dir) = temp_store();
        let user = store
            .insert(User {
                email: Some("a@example.com".into()),
                ..User::new()
            })
            .unwrap();

        assert!(matches!(
            store.insert(user.clone()),
            Err(StoreError::Duplicate(_))
        ));

        let updated = store
            .update(User {
                display_name: Some("Ada".into()),
                ..user.clone()
            })
            .unwrap();
        assert_eq!(store.get(user.id).unwrap(), Some(updated));
        assert!(matches!(
            store.update(User::new()),
            Err(StoreError::NotFound(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    /// Writes land on disk but the final rename never happens, as if the
    /// process died between the two.
    struct InterruptedFs;

    impl FilesystemOps for InterruptedFs {
        fn read_file(&self, path: &Path) -> CapResult<Vec<u8>> {
            StdFilesystem.read_file(path)
        }
        fn write_file(&self, path: &Path, data: &[u8]) -> CapResult<()> {
            StdFilesystem.write_file(path, data)
        }
        fn rename(&self, _from: &Path, _to: &Path) -> CapResult<()> {
            Err(CapError::Other("interrupted".into()))
        }
        fn remove_dir_all(&self, path: &Path) -> CapResult<()> {
            StdFilesystem.remove_dir_all(path)
        }
        fn exists(&self, path: &Path) -> bool {
            StdFilesystem.exists(path)
        }
    }

    #[test]
    fn test_interrupted_save_keeps_previous_table() {
        let (store, dir) = temp_store();
        let kept = store.insert(User::new()).unwrap();

        let interrupted = JsonUserStore::new(Arc::new(InterruptedFs), store.path());
        assert!(matches!(
            interrupted.insert(User::new()),
            Err(StoreError::Cap(_))
        ));
        assert!(dir.join("users.json.tmp").exists());
        assert_eq!(store.list().unwrap(), vec![kept.clone()]);

        // The leftover scratch file is simply overwritten next time.
        let added = store.insert(User::new()).unwrap();
        assert_eq!(store.list().unwrap(), vec![kept, added]);
        assert!(!dir.join("users.json.tmp").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let u: User = serde_json::from_str(r#"{ "email": "b@example.com", "isAdmin": true }"#).unwrap();
        assert_eq!(u.is_admin, Some(true));
        assert_ne!(u.id, Uuid::nil());
    }
}
