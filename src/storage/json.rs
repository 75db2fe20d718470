use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{validate_course_id, RosterStore, StoreError, StoreResult};
use crate::model::Roster;

pub const USERS_FILENAME: &str = "users.json";

/// File-backed roster store rooted at a folder: `<root>/<course id>/users.json`.
///
/// The file holds a JSON object keyed by email. Writes go to a sibling temp file that
/// is renamed over the existing file, and are serialized through a store-wide lock.
pub struct JsonRosterStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRosterStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf(), write_lock: Mutex::new(()) }
    }

    pub fn root_path(&self) -> &Path { &self.root }

    pub fn users_path(&self, course_id: &str) -> StoreResult<PathBuf> {
        validate_course_id(course_id)?;
        Ok(self.root.join(course_id).join(USERS_FILENAME))
    }
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io { path: path.to_path_buf(), source }
}

impl RosterStore for JsonRosterStore {
    fn load(&self, course_id: &str) -> StoreResult<Roster> {
        let path = self.users_path(course_id)?;
        if !path.exists() {
            debug!(target: "coursegate::store", "load: no roster at '{}', starting empty", path.display());
            return Ok(Roster::new());
        }
        let bytes = fs::read(&path).map_err(|e| io_err(&path, e))?;
        let mut roster: Roster = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Format { path: path.clone(), source })?;
        // The map key is authoritative for the email.
        for (email, user) in roster.iter_mut() {
            if user.email != *email {
                if !user.email.is_empty() {
                    warn!(target: "coursegate::store", "load: entry '{}' in '{}' names email '{}'; using the key", email, path.display(), user.email);
                }
                user.email = email.clone();
            }
        }
        debug!(target: "coursegate::store", "load: course='{}' users={}", course_id, roster.len());
        Ok(roster)
    }

    fn save(&self, course_id: &str, roster: &Roster) -> StoreResult<()> {
        let path = self.users_path(course_id)?;
        let _guard = self.write_lock.lock();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        let body = serde_json::to_vec_pretty(roster)
            .map_err(|source| StoreError::Format { path: path.clone(), source })?;
        let tmp = path.with_extension("json.tmp");
        let written = fs::write(&tmp, &body)
            .map_err(|e| io_err(&tmp, e))
            .and_then(|_| fs::rename(&tmp, &path).map_err(|e| io_err(&path, e)));
        if let Err(e) = written {
            if let Err(rm) = fs::remove_file(&tmp) {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!(target: "coursegate::store", "save: could not remove '{}': {}", tmp.display(), rm);
                }
            }
            return Err(e);
        }
        debug!(target: "coursegate::store", "save: course='{}' users={} path='{}'", course_id, roster.len(), path.display());
        Ok(())
    }
}
