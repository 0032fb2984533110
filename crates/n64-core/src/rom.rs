//! ROM image loading

use crate::error::LoadError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extensions offered by the ROM file dialog. Advisory only: any file
/// is accepted.
pub const ROM_EXTENSIONS: [&str; 3] = ["n64", "v64", "z64"];

/// Immutable ROM bytes read from disk. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct RomImage {
    path: PathBuf,
    data: Arc<[u8]>,
}

impl RomImage {
    /// Read the whole file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if data.is_empty() {
            return Err(LoadError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            data: data.into(),
        })
    }

    /// Path the image was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used in log messages
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a loaded image
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte-order hint derived from the header
    pub fn format(&self) -> RomFormat {
        RomFormat::detect(&self.data)
    }
}

impl fmt::Debug for RomImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RomImage")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Byte order of a cartridge dump, guessed from its first word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomFormat {
    /// Native big-endian (.z64)
    BigEndian,
    /// 16-bit byte-swapped (.v64)
    ByteSwapped,
    /// 32-bit little-endian (.n64)
    LittleEndian,
    Unknown,
}

impl RomFormat {
    /// Guess the byte order from the PI domain header word.
    ///
    /// Informational only; never used to reject an image.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.get(0..4) {
            Some([0x80, 0x37, 0x12, 0x40]) => RomFormat::BigEndian,
            Some([0x37, 0x80, 0x40, 0x12]) => RomFormat::ByteSwapped,
            Some([0x40, 0x12, 0x37, 0x80]) => RomFormat::LittleEndian,
            _ => RomFormat::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RomFormat::BigEndian => "z64 (big-endian)",
            RomFormat::ByteSwapped => "v64 (byte-swapped)",
            RomFormat::LittleEndian => "n64 (little-endian)",
            RomFormat::Unknown => "unknown",
        }
    }
}
