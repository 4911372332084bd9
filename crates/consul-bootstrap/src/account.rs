//! Run-as user lookup and file ownership
//!
//! Reads the system user database directly instead of spawning a login
//! shell to learn a user's home directory.

use anyhow::Context;
use consul_bootstrap_core::{BootstrapError, RunAsUser};
use nix::unistd::{Gid, Uid, User, chown};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Access to the user database
pub trait UserDirectory: Send + Sync {
    /// Look up `name`. An unknown user is a fatal configuration error.
    fn lookup(&self, name: &str) -> anyhow::Result<RunAsUser>;

    /// Name of the user owning `path`
    fn owner_of(&self, path: &Path) -> anyhow::Result<String>;
}

/// `getpwnam`/`getpwuid` backed directory
#[derive(Debug, Default)]
pub struct SystemUsers;

impl UserDirectory for SystemUsers {
    fn lookup(&self, name: &str) -> anyhow::Result<RunAsUser> {
        let user = User::from_name(name)
            .with_context(|| format!("failed to read user database entry for '{}'", name))?
            .ok_or_else(|| BootstrapError::FatalConfig(format!("user '{}' does not exist", name)))?;

        Ok(RunAsUser {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home_dir: user.dir,
        })
    }

    fn owner_of(&self, path: &Path) -> anyhow::Result<String> {
        let uid = std::fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .uid();
        let user = User::from_uid(Uid::from_raw(uid))
            .with_context(|| format!("failed to read user database entry for uid {}", uid))?
            .ok_or_else(|| {
                BootstrapError::FatalConfig(format!(
                    "owner uid {} of {} has no user database entry",
                    uid,
                    path.display()
                ))
            })?;
        Ok(user.name)
    }
}

/// Hand `path` over to `user`
pub fn set_owner(path: &Path, user: &RunAsUser) -> anyhow::Result<()> {
    chown(
        path,
        Some(Uid::from_raw(user.uid)),
        Some(Gid::from_raw(user.gid)),
    )
    .with_context(|| format!("failed to chown {} to {}", path.display(), user.name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{getgid, getuid};

    #[test]
    fn test_owner_of_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let me = User::from_uid(getuid()).unwrap().unwrap();

        let owner = SystemUsers.owner_of(dir.path()).unwrap();
        assert_eq!(owner, me.name);

        let user = SystemUsers.lookup(&me.name).unwrap();
        assert_eq!(user.uid, getuid().as_raw());
        assert_eq!(user.home_dir, me.dir);
    }

    #[test]
    fn test_unknown_user_is_fatal() {
        let err = SystemUsers
            .lookup("no-such-user-consul-bootstrap")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BootstrapError>(),
            Some(BootstrapError::FatalConfig(_))
        ));
    }

    #[test]
    fn test_set_owner_to_self() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.json");
        std::fs::write(&path, "{}").unwrap();

        let user = RunAsUser {
            name: "me".to_string(),
            uid: getuid().as_raw(),
            gid: getgid().as_raw(),
            home_dir: dir.path().to_path_buf(),
        };
        set_owner(&path, &user).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().uid(), user.uid);
    }
}
