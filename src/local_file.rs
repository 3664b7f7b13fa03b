use std::fs::Metadata;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs;

/// Local end of a transfer.
#[derive(Debug)]
pub struct LocalFile {
    pub file: fs::File,
    pub path: PathBuf,
    pub size: u64,
    /// Octal text form, e.g. `0644`.
    pub permissions: String,
}

impl LocalFile {
    pub async fn open(path: PathBuf) -> Result<Self, std::io::Error> {
        let file = fs::File::open(&path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let permissions = permission_string(&metadata);

        info!(
            "Opened file: {:?}, {} bytes, mode {}",
            path,
            metadata.len(),
            permissions
        );

        Ok(Self {
            file,
            path,
            size: metadata.len(),
            permissions,
        })
    }

    /// Creates `dir/name` for a file announced by the remote side.
    pub async fn create(
        dir: &Path,
        name: &str,
        size: u64,
        permissions: &str,
    ) -> Result<Self, std::io::Error> {
        let path = dir.join(name);
        let file = fs::File::create(&path).await?;
        apply_permissions(&path, permissions).await;

        info!("Created file: {:?} for {} bytes", path, size);

        Ok(Self {
            file,
            path,
            size,
            permissions: permissions.to_string(),
        })
    }
}

pub fn permission_string(metadata: &Metadata) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        format!("{:04o}", metadata.permissions().mode() & 0o7777)
    }

    #[cfg(not(unix))]
    {
        if metadata.permissions().readonly() {
            "0444".to_string()
        } else {
            "0644".to_string()
        }
    }
}

async fn apply_permissions(path: &Path, permissions: &str) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        // setuid, setgid and sticky bits from the peer are dropped
        match u32::from_str_radix(permissions, 8) {
            Ok(mode) => {
                let perms = std::fs::Permissions::from_mode(mode & 0o777);
                if let Err(e) = fs::set_permissions(path, perms).await {
                    warn!("Failed to set mode {} on {:?}: {}", permissions, path, e);
                }
            }
            Err(_) => warn!("Ignoring unparsable mode {:?} for {:?}", permissions, path),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (path, permissions);
    }
}
