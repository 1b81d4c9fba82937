//! File payloads for file and image items.
//!
//! A [`FileSource`] is built from a [`FileInput`]: either a path, which is
//! checked at construction and opened only for the duration of each copy, or
//! an already-open stream, which the source owns and rewinds before every copy.

use std::cell::RefCell;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

/// Anything that can be drained from the start more than once.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Caller-facing input for a file or image item.
pub enum FileInput {
    /// A file on disk
    Path(PathBuf),
    /// An open stream, optionally named (the name implies an extension)
    Stream {
        /// The stream; ownership moves into the item
        reader: Box<dyn ReadSeek>,
        /// File name the stream came from, if any
        name: Option<String>,
    },
}

impl FileInput {
    /// Input backed by a file path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        FileInput::Path(path.into())
    }

    /// Input backed by an unnamed stream, e.g. an in-memory buffer.
    pub fn stream(reader: impl Read + Seek + 'static) -> Self {
        FileInput::Stream {
            reader: Box::new(reader),
            name: None,
        }
    }

    /// Input backed by a stream that knows its file name.
    pub fn named_stream(reader: impl Read + Seek + 'static, name: impl Into<String>) -> Self {
        FileInput::Stream {
            reader: Box::new(reader),
            name: Some(name.into()),
        }
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        FileInput::Path(path)
    }
}

impl From<&Path> for FileInput {
    fn from(path: &Path) -> Self {
        FileInput::Path(path.to_path_buf())
    }
}

enum Handle {
    Path(PathBuf),
    Stream(RefCell<Box<dyn ReadSeek>>),
}

/// Validated file payload with its resolved extension.
pub struct FileSource {
    handle: Handle,
    source_name: Option<String>,
    extension: Option<String>,
}

impl FileSource {
    /// Validate the input and resolve its extension.
    ///
    /// Fails with [`ReportError::MissingSource`] when a path does not exist and
    /// with [`ReportError::ExtensionConflict`] when `extension` disagrees with
    /// the extension implied by the source name. The implied extension wins
    /// when both are present and equal; `extension` may include a leading dot.
    pub fn new(input: FileInput, extension: Option<&str>) -> Result<Self> {
        let explicit = extension.map(normalize_extension).filter(|ext| !ext.is_empty());

        let (handle, source_name) = match input {
            FileInput::Path(path) => {
                if !path.is_file() {
                    return Err(ReportError::MissingSource(path));
                }
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                (Handle::Path(path), name)
            }
            FileInput::Stream { reader, name } => (Handle::Stream(RefCell::new(reader)), name),
        };

        let implied = source_name.as_deref().and_then(implied_extension);
        let extension = match (explicit, implied) {
            (Some(explicit), Some(implied)) if !explicit.eq_ignore_ascii_case(&implied) => {
                return Err(ReportError::ExtensionConflict {
                    explicit,
                    implied,
                    source_name: source_name.unwrap_or_default(),
                });
            }
            (_, Some(implied)) => Some(implied),
            (explicit, None) => explicit,
        };

        Ok(Self {
            handle,
            source_name,
            extension,
        })
    }

    /// Resolved extension without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// File name of the source, when known.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Destination file name for a given stem.
    pub fn file_name_for(&self, stem: &str) -> String {
        match &self.extension {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        }
    }

    /// Copy the full content to `dir/<stem>.<ext>` and return the new path.
    ///
    /// The destination must not exist ([`ReportError::DestinationExists`]).
    /// A path source is opened here and closed on return; a stream source is
    /// rewound first. A partially written destination is removed on failure.
    pub fn copy_to(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        let dest = dir.join(self.file_name_for(stem));
        let file = create_new(&dest)?;

        let mut out = BufWriter::new(file);
        let copied = self.drain_into(&mut out).and_then(|_| out.flush());
        drop(out);
        if let Err(err) = copied {
            let _ = fs::remove_file(&dest);
            return Err(err.into());
        }

        tracing::debug!("copied {} to {}", self.describe(), dest.display());
        Ok(dest)
    }

    fn drain_into(&self, out: &mut impl Write) -> io::Result<u64> {
        match &self.handle {
            Handle::Path(path) => {
                let mut src = File::open(path)?;
                io::copy(&mut src, out)
            }
            Handle::Stream(cell) => {
                let mut reader = cell.borrow_mut();
                reader.seek(SeekFrom::Start(0))?;
                io::copy(&mut *reader, out)
            }
        }
    }

    fn describe(&self) -> String {
        match (&self.handle, &self.source_name) {
            (Handle::Path(path), _) => path.display().to_string(),
            (Handle::Stream(_), Some(name)) => format!("stream `{name}`"),
            (Handle::Stream(_), None) => "in-memory stream".to_string(),
        }
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("source", &self.describe())
            .field("extension", &self.extension)
            .finish()
    }
}

/// Open `path` for writing, failing with [`ReportError::DestinationExists`]
/// instead of truncating an existing file.
pub fn create_new(path: &Path) -> Result<File> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(file),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(ReportError::DestinationExists(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

fn implied_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .filter(|ext| !ext.is_empty())
}
