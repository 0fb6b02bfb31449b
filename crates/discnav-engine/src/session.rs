//! Package origin detection and backend handle ownership.

use discnav_common::{Error, PlaylistId, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{BackendSettings, DiscBackend, ImageReader, PackageProvider};

/// Where a disc package lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOrigin {
    /// Extracted `BDMV` directory tree; `root` contains `BDMV/`.
    DirectoryTree { root: PathBuf },
    /// Single-file image read through a seekable byte source.
    StreamedImage { image: PathBuf },
    /// Optical drive or other block device.
    RawDevice { device: PathBuf },
}

impl PackageOrigin {
    /// The path handed to the package library.
    pub fn path(&self) -> &Path {
        match self {
            PackageOrigin::DirectoryTree { root } => root,
            PackageOrigin::StreamedImage { image } => image,
            PackageOrigin::RawDevice { device } => device,
        }
    }
}

impl std::fmt::Display for PackageOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageOrigin::DirectoryTree { root } => write!(f, "directory tree {}", root.display()),
            PackageOrigin::StreamedImage { image } => write!(f, "disc image {}", image.display()),
            PackageOrigin::RawDevice { device } => write!(f, "device {}", device.display()),
        }
    }
}

/// Result of inspecting a caller-supplied path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLocation {
    pub origin: PackageOrigin,
    /// Playlist named by the path itself (`BDMV/PLAYLIST/NNNNN.mpls`).
    pub playlist_hint: Option<PlaylistId>,
}

const IMAGE_EXTENSIONS: &[&str] = &["iso", "img", "udf"];

fn name_is(path: Option<&Path>, name: &str) -> bool {
    path.and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(name))
}

fn extension_of(path: &Path) -> Option<String> {
    Some(path.extension()?.to_str()?.to_ascii_lowercase())
}

fn looks_like_device(path: &Path) -> bool {
    let text = path.to_string_lossy();
    if text.starts_with("/dev/") || text.starts_with(r"\\.\") {
        return true;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if let Ok(meta) = std::fs::metadata(path) {
            let ft = meta.file_type();
            return ft.is_block_device() || ft.is_char_device();
        }
    }
    false
}

/// Decide the package origin from the shape of `path`.
pub fn classify(path: &Path) -> Result<PackageLocation> {
    if looks_like_device(path) {
        return Ok(PackageLocation {
            origin: PackageOrigin::RawDevice {
                device: path.to_path_buf(),
            },
            playlist_hint: None,
        });
    }

    let meta = std::fs::metadata(path)
        .map_err(|e| Error::open(format!("{}: {e}", path.display())))?;

    if meta.is_dir() {
        let root = if name_is(Some(path), "BDMV") {
            path.parent().unwrap_or(path).to_path_buf()
        } else if path.join("BDMV").is_dir() {
            path.to_path_buf()
        } else {
            return Err(Error::open(format!(
                "{} does not contain a BDMV directory",
                path.display()
            )));
        };
        return Ok(PackageLocation {
            origin: PackageOrigin::DirectoryTree { root },
            playlist_hint: None,
        });
    }

    let ext = extension_of(path);
    let parent = path.parent();

    if ext.as_deref() == Some("mpls") {
        let playlist_dir = parent.filter(|p| name_is(Some(p), "PLAYLIST"));
        let bdmv = playlist_dir.and_then(Path::parent);
        if name_is(bdmv, "BDMV") {
            let root = bdmv.and_then(Path::parent).unwrap_or(Path::new("."));
            let hint = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
                .map(PlaylistId);
            return Ok(PackageLocation {
                origin: PackageOrigin::DirectoryTree {
                    root: root.to_path_buf(),
                },
                playlist_hint: hint,
            });
        }
        return Err(Error::open(format!(
            "{} is not inside BDMV/PLAYLIST",
            path.display()
        )));
    }

    if name_is(Some(path), "index.bdmv") {
        let root = match parent {
            Some(p) if name_is(Some(p), "BDMV") => p.parent().unwrap_or(Path::new(".")),
            Some(p) => p,
            None => Path::new("."),
        };
        return Ok(PackageLocation {
            origin: PackageOrigin::DirectoryTree {
                root: root.to_path_buf(),
            },
            playlist_hint: None,
        });
    }

    if ext.as_deref().is_some_and(|e| IMAGE_EXTENSIONS.contains(&e)) {
        return Ok(PackageLocation {
            origin: PackageOrigin::StreamedImage {
                image: path.to_path_buf(),
            },
            playlist_hint: None,
        });
    }

    Err(Error::open(format!(
        "{} is not a disc package",
        path.display()
    )))
}

/// One opened (or openable) disc package.
///
/// The session owns the backend handle; the engine borrows it through
/// [`DiscSession::handle_mut`].
pub struct DiscSession {
    location: PackageLocation,
    provider: Arc<dyn PackageProvider>,
    settings: BackendSettings,
    handle: Option<Box<dyn DiscBackend>>,
}

impl DiscSession {
    /// Classify `path` and bind it to a package provider.
    pub fn new(
        path: impl AsRef<Path>,
        provider: Arc<dyn PackageProvider>,
        settings: BackendSettings,
    ) -> Result<Self> {
        let location = classify(path.as_ref())?;
        tracing::debug!(origin = %location.origin, hint = ?location.playlist_hint, "classified disc package");
        Ok(Self::from_location(location, provider, settings))
    }

    pub fn from_location(
        location: PackageLocation,
        provider: Arc<dyn PackageProvider>,
        settings: BackendSettings,
    ) -> Self {
        Self {
            location,
            provider,
            settings,
            handle: None,
        }
    }

    pub fn origin(&self) -> &PackageOrigin {
        &self.location.origin
    }

    pub fn playlist_hint(&self) -> Option<PlaylistId> {
        self.location.playlist_hint
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Open the package from its path. Images are opened as files and
    /// streamed through the provider's reader entry point.
    pub fn open_direct(&mut self) -> Result<()> {
        match &self.location.origin {
            PackageOrigin::StreamedImage { image } => {
                let file = File::open(image)
                    .map_err(|e| Error::open(format!("{}: {e}", image.display())))?;
                self.open_streamed(Box::new(BufReader::new(file)))
            }
            origin => {
                let path = origin.path().to_path_buf();
                self.close();
                let handle = self
                    .provider
                    .open_path(&path, &self.settings)
                    .map_err(|e| Error::open(e.to_string()))?;
                self.handle = Some(handle);
                Ok(())
            }
        }
    }

    /// Open the package through a caller-supplied byte source.
    pub fn open_streamed(&mut self, reader: Box<dyn ImageReader>) -> Result<()> {
        self.close();
        let handle = self
            .provider
            .open_reader(reader, &self.settings)
            .map_err(|e| Error::open(e.to_string()))?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Release the backend handle, if any.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            tracing::debug!(origin = %self.location.origin, "closing disc package");
            handle.close();
        }
    }

    pub fn handle_mut(&mut self) -> Option<&mut dyn DiscBackend> {
        match &mut self.handle {
            Some(handle) => Some(handle.as_mut()),
            None => None,
        }
    }
}

impl Drop for DiscSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedCall;
    use crate::backend::{ScriptedDisc, ScriptedProvider};
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;

    fn disc_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("BDMV/PLAYLIST")).unwrap();
        fs::write(dir.path().join("BDMV/index.bdmv"), b"INDX0200").unwrap();
        fs::write(dir.path().join("BDMV/PLAYLIST/00010.mpls"), b"MPLS0200").unwrap();
        dir
    }

    #[test]
    fn test_classify_directory_tree() {
        let dir = disc_tree();
        let root = dir.path().to_path_buf();

        for path in [
            root.clone(),
            root.join("BDMV"),
            root.join("BDMV/index.bdmv"),
        ] {
            let loc = classify(&path).unwrap();
            assert_eq!(loc.origin, PackageOrigin::DirectoryTree { root: root.clone() });
            assert_eq!(loc.playlist_hint, None);
        }
    }

    #[test]
    fn test_classify_playlist_file_gives_hint() {
        let dir = disc_tree();
        let loc = classify(&dir.path().join("BDMV/PLAYLIST/00010.mpls")).unwrap();
        assert_eq!(
            loc.origin,
            PackageOrigin::DirectoryTree {
                root: dir.path().to_path_buf()
            }
        );
        assert_eq!(loc.playlist_hint, Some(PlaylistId(10)));
    }

    #[test]
    fn test_classify_image_and_device() {
        let dir = TempDir::new().unwrap();
        let iso = dir.path().join("MOVIE.ISO");
        fs::write(&iso, b"").unwrap();
        assert_matches!(
            classify(&iso).unwrap().origin,
            PackageOrigin::StreamedImage { .. }
        );

        assert_matches!(
            classify(Path::new("/dev/sr0")).unwrap().origin,
            PackageOrigin::RawDevice { .. }
        );
    }

    #[test]
    fn test_classify_rejects_other_paths() {
        let dir = TempDir::new().unwrap();
        let movie = dir.path().join("movie.mkv");
        fs::write(&movie, b"").unwrap();

        assert_matches!(classify(&movie), Err(Error::OpenFailure(_)));
        assert_matches!(classify(dir.path()), Err(Error::OpenFailure(_)));
        assert_matches!(
            classify(&dir.path().join("missing")),
            Err(Error::OpenFailure(_))
        );
    }

    #[test]
    fn test_open_and_close_handle() {
        let dir = disc_tree();
        let provider = Arc::new(ScriptedProvider::new(ScriptedDisc::default()));
        let calls = provider.calls();

        let mut session =
            DiscSession::new(dir.path(), provider, BackendSettings::default()).unwrap();
        assert!(session.handle_mut().is_none());

        session.open_direct().unwrap();
        assert!(session.is_open());

        session.close();
        assert!(!session.is_open());
        assert_eq!(calls.lock().as_slice(), &[ScriptedCall::Close]);
    }

    #[test]
    fn test_reopen_directory_closes_previous_handle() {
        let dir = disc_tree();
        let provider = Arc::new(ScriptedProvider::new(ScriptedDisc::default()));
        let calls = provider.calls();

        let mut session =
            DiscSession::new(dir.path(), provider, BackendSettings::default()).unwrap();
        session.open_direct().unwrap();
        session.open_direct().unwrap();

        assert!(session.is_open());
        assert_eq!(calls.lock().as_slice(), &[ScriptedCall::Close]);
    }

    #[test]
    fn test_open_streamed_image() {
        let dir = TempDir::new().unwrap();
        let iso = dir.path().join("disc.iso");
        fs::write(&iso, vec![0u8; 2048]).unwrap();

        let provider = Arc::new(ScriptedProvider::new(ScriptedDisc::default()));
        let mut session = DiscSession::new(&iso, provider, BackendSettings::default()).unwrap();
        session.open_direct().unwrap();
        assert!(session.is_open());

        let reader = std::io::Cursor::new(vec![0u8; 2048]);
        session.open_streamed(Box::new(reader)).unwrap();
        assert!(session.is_open());
    }
}
