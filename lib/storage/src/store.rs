// Versioned artifact store on the local filesystem
//
// Layout: <root>/<status>/<version>/<name> with a <name>.sha256 sidecar.
// Versions are UTC stamps; the latest version of a status is the greatest
// parseable stamp under it.
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
const DAY_FORMAT: &str = "%Y-%m-%d";

/// Pipeline stage an artifact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Cleaned,
    Features,
    Models,
}

impl ArtifactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::Cleaned => "cleaned",
            ArtifactStatus::Features => "features",
            ArtifactStatus::Models => "models",
        }
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of a stored artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescription {
    pub status: ArtifactStatus,
    pub version: String,
    pub name: String,
    pub size: u64,
    pub checksum: String,
}

/// Stamp for a new version, taken from the current UTC time.
pub fn new_version() -> String {
    Utc::now().format(STAMP_FORMAT).to_string()
}

/// Parse a version stamp; day-only stamps count as midnight.
pub fn parse_version(version: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(version, STAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(version, DAY_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn sidecar(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .with_context(|| format!("writing {}", path.display()))
}

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating artifact root {}", root.display()))?;
        Ok(Self { root })
    }

    /// Open an existing store without creating anything.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(anyhow!("artifact root {} does not exist", root.display()));
        }
        Ok(Self { root })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn status_dir(&self, status: ArtifactStatus) -> PathBuf {
        self.root.join(status.as_str())
    }

    pub fn artifact_path(&self, status: ArtifactStatus, version: &str, name: &str) -> PathBuf {
        self.status_dir(status).join(version).join(name)
    }

    /// Versions stored under a status, oldest first.
    pub fn list_versions(&self, status: ArtifactStatus) -> Result<Vec<String>> {
        let dir = self.status_dir(status);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                match parse_version(name) {
                    Some(stamp) => versions.push((stamp, name.to_string())),
                    None => debug!(status = %status, entry = name, "ignoring non-version entry"),
                }
            }
        }

        versions.sort();
        Ok(versions.into_iter().map(|(_, v)| v).collect())
    }

    pub fn latest_version(&self, status: ArtifactStatus) -> Result<String> {
        self.list_versions(status)?
            .pop()
            .ok_or_else(|| anyhow!("no versions found under '{}'", status))
    }

    /// Newest version of `status` that contains `name`.
    pub fn latest_version_with(&self, status: ArtifactStatus, name: &str) -> Result<String> {
        self.list_versions(status)?
            .into_iter()
            .rev()
            .find(|v| self.artifact_path(status, v, name).exists())
            .ok_or_else(|| anyhow!("no version of '{}' contains {}", status, name))
    }

    fn put_bytes(&self, status: ArtifactStatus, version: &str, name: &str, raw: &[u8]) -> Result<ArtifactDescription> {
        if parse_version(version).is_none() {
            return Err(anyhow!("invalid version stamp '{}'", version));
        }
        let path = self.artifact_path(status, version, name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw)?;
        let compressed = encoder.finish()?;

        let sum = checksum(&compressed);
        write_atomic(&path, &compressed)?;
        write_atomic(&sidecar(&path), sum.as_bytes())?;

        info!(status = %status, version, name, bytes = compressed.len(), "stored artifact");
        Ok(ArtifactDescription {
            status,
            version: version.to_string(),
            name: name.to_string(),
            size: compressed.len() as u64,
            checksum: sum,
        })
    }

    fn get_bytes(&self, status: ArtifactStatus, version: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.artifact_path(status, version, name);
        let compressed = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;

        match fs::read_to_string(sidecar(&path)) {
            Ok(expected) => {
                let actual = checksum(&compressed);
                if expected.trim() != actual {
                    return Err(anyhow!(
                        "checksum mismatch for {}: expected {}, got {}",
                        path.display(),
                        expected.trim(),
                        actual
                    ));
                }
            }
            Err(_) => warn!(path = %path.display(), "artifact has no checksum sidecar"),
        }

        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw)?;
        Ok(raw)
    }

    pub fn put_json<T: Serialize>(&self, status: ArtifactStatus, version: &str, name: &str, value: &T) -> Result<ArtifactDescription> {
        let raw = serde_json::to_vec(value)?;
        self.put_bytes(status, version, name, &raw)
    }

    pub fn get_json<T: DeserializeOwned>(&self, status: ArtifactStatus, version: &str, name: &str) -> Result<T> {
        let raw = self.get_bytes(status, version, name)?;
        serde_json::from_slice(&raw).with_context(|| format!("decoding {}/{}/{}", status, version, name))
    }

    pub fn put_bincode<T: Serialize>(&self, status: ArtifactStatus, version: &str, name: &str, value: &T) -> Result<ArtifactDescription> {
        let raw = bincode::serialize(value).map_err(|e| anyhow!("Serialization error: {}", e))?;
        self.put_bytes(status, version, name, &raw)
    }

    pub fn get_bincode<T: DeserializeOwned>(&self, status: ArtifactStatus, version: &str, name: &str) -> Result<T> {
        let raw = self.get_bytes(status, version, name)?;
        bincode::deserialize(&raw).map_err(|e| anyhow!("Deserialization error in {}/{}/{}: {}", status, version, name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_formats() {
        assert!(parse_version("2024-05-01-13-45-00").is_some());
        assert!(parse_version("2024-05-01").is_some());
        assert!(parse_version("latest").is_none());
        assert!(parse_version(&new_version()).is_some());
    }

    #[test]
    fn test_latest_version_by_stamp_not_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        for v in ["2024-05-01", "2024-05-01-09-00-00", "2023-12-31-23-59-59"] {
            store.put_json(ArtifactStatus::Models, v, "x.json.gz", &v).unwrap();
        }
        fs::create_dir_all(dir.path().join("models").join("scratch")).unwrap();

        assert_eq!(
            store.list_versions(ArtifactStatus::Models).unwrap(),
            vec!["2023-12-31-23-59-59", "2024-05-01", "2024-05-01-09-00-00"]
        );
        assert_eq!(store.latest_version(ArtifactStatus::Models).unwrap(), "2024-05-01-09-00-00");
        assert!(store.latest_version(ArtifactStatus::Cleaned).is_err());
    }

    #[test]
    fn test_json_and_bincode_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let value = vec![(1u64, 0.5f32), (2, 0.25)];

        let desc = store.put_json(ArtifactStatus::Features, "2024-01-01", "a.json.gz", &value).unwrap();
        assert_eq!(desc.checksum.len(), 64);
        let back: Vec<(u64, f32)> = store.get_json(ArtifactStatus::Features, "2024-01-01", "a.json.gz").unwrap();
        assert_eq!(back, value);

        store.put_bincode(ArtifactStatus::Models, "2024-01-01", "b.bin.gz", &value).unwrap();
        let back: Vec<(u64, f32)> = store.get_bincode(ArtifactStatus::Models, "2024-01-01", "b.bin.gz").unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_corruption_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        store.put_json(ArtifactStatus::Cleaned, "2024-01-01", "m.json.gz", &"hello").unwrap();

        let path = store.artifact_path(ArtifactStatus::Cleaned, "2024-01-01", "m.json.gz");
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        let err = store
            .get_json::<String>(ArtifactStatus::Cleaned, "2024-01-01", "m.json.gz")
            .unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_latest_version_with_skips_incomplete_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        store.put_json(ArtifactStatus::Models, "2024-01-01", "sim", &1).unwrap();
        store.put_json(ArtifactStatus::Models, "2024-02-01", "other", &2).unwrap();
        assert_eq!(store.latest_version_with(ArtifactStatus::Models, "sim").unwrap(), "2024-01-01");
    }

    #[test]
    fn test_rejects_bad_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        assert!(store.put_json(ArtifactStatus::Models, "../escape", "x", &1).is_err());
    }
}
