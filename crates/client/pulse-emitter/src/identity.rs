//! Anonymous user identity

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

const PREFIX: &str = "user_";
const SUFFIX_LEN: usize = 9;

/// The anonymous id attached to every event from this installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    user_id: String,
    persisted: bool,
}

impl UserIdentity {
    /// Read the id stored at `path`, creating and storing a new one if absent.
    ///
    /// If the file cannot be read or written the returned identity is
    /// ephemeral: valid for this process only.
    pub fn load_or_create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => {
                return Self {
                    user_id: contents.trim().to_string(),
                    persisted: true,
                };
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Could not read user id");
                return Self::ephemeral();
            }
        }

        let user_id = generate();
        match store(path, &user_id) {
            Ok(()) => Self {
                user_id,
                persisted: true,
            },
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Could not persist user id");
                Self {
                    user_id,
                    persisted: false,
                }
            }
        }
    }

    /// A fresh id that is not written anywhere
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            user_id: generate(),
            persisted: false,
        }
    }

    /// The `user_…` identifier
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Whether the id survives a restart
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }
}

fn generate() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{PREFIX}{}", &simple[..SUFFIX_LEN])
}

fn store(path: &Path, user_id: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, user_id)
}
