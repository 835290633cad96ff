//! Permission lock applied to finished documents.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions, StringFormat};

use crate::error::{Error, Result};

/// Applies document-level permission restrictions to serialized bytes.
pub trait PermissionLock: Send + Sync {
    /// Return a copy of `data` with restrictions applied.
    fn lock(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Permissions granted by a lock: everything denied except accessibility.
pub const LOCK_PERMISSIONS: Permissions = Permissions::COPYABLE_FOR_ACCESSIBILITY;

/// In-process lock with the standard security handler (revision 3,
/// 128-bit key): empty open password, random owner password and
/// [`LOCK_PERMISSIONS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfLock;

impl LopdfLock {
    /// Encryption key length in bits.
    pub const KEY_LENGTH: usize = 128;

    pub fn new() -> Self {
        Self
    }
}

impl PermissionLock for LopdfLock {
    fn lock(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| Error::Lock(format!("cannot load document: {}", e)))?;
        if doc.is_encrypted() {
            return Err(Error::Lock("document is still encrypted".to_string()));
        }

        // Key derivation hashes the first file identifier
        if !doc.trailer.has(b"ID") {
            let id: [u8; 16] = rand::random();
            doc.trailer.set(
                "ID",
                vec![
                    Object::String(id.to_vec(), StringFormat::Hexadecimal),
                    Object::String(id.to_vec(), StringFormat::Hexadecimal),
                ],
            );
        }

        let owner = owner_password();
        let state = EncryptionState::try_from(EncryptionVersion::V2 {
            document: &doc,
            owner_password: &owner,
            user_password: "",
            key_length: Self::KEY_LENGTH,
            permissions: LOCK_PERMISSIONS,
        })
        .map_err(|e| Error::Lock(e.to_string()))?;

        doc.encrypt(&state)
            .map_err(|e| Error::Lock(e.to_string()))?;

        let mut locked = Vec::new();
        doc.save_to(&mut locked)
            .map_err(|e| Error::Lock(e.to_string()))?;
        log::debug!("Permission lock applied ({} bytes)", locked.len());
        Ok(locked)
    }
}

/// Lock using the `qpdf` program: empty open password, printing,
/// modification and extraction denied, accessibility allowed.
#[derive(Debug, Clone)]
pub struct QpdfLock {
    program: PathBuf,
}

impl QpdfLock {
    /// Program name looked up on `PATH`.
    pub const DEFAULT_PROGRAM: &'static str = "qpdf";

    /// Use `qpdf` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(Self::DEFAULT_PROGRAM)
    }

    /// Use a specific qpdf executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Configured executable.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for QpdfLock {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionLock for QpdfLock {
    fn lock(&self, data: &[u8]) -> Result<Vec<u8>> {
        // Removed with its contents when dropped, on every return path
        let dir = tempfile::Builder::new().prefix("pdfscrub-").tempdir()?;
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("locked.pdf");
        std::fs::write(&input, data)?;

        let result = Command::new(&self.program)
            .arg("--encrypt")
            .arg("")
            .arg(owner_password())
            .arg("256")
            .args([
                "--print=none",
                "--modify=none",
                "--extract=n",
                "--accessibility=y",
                "--",
            ])
            .arg(&input)
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Lock(format!("cannot run {}: {}", self.program.display(), e)))?;

        // qpdf exits with 3 when it succeeded with warnings
        match result.status.code() {
            Some(0) | Some(3) => {}
            code => {
                let stderr = String::from_utf8_lossy(&result.stderr);
                return Err(Error::Lock(format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                    stderr.trim()
                )));
            }
        }

        let locked = std::fs::read(&output)?;
        log::debug!("Permission lock applied ({} bytes)", locked.len());
        Ok(locked)
    }
}

/// Random owner password, 128 bits hex-encoded.
fn owner_password() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
