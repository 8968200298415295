use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{ScatterError, ScatterResult};

/// Which sources the loader admits.
///
/// The asset root plays the role of the page origin: `SameOrigin` only reads relative paths
/// beneath it, `Anonymous` additionally reads absolute paths and `file://` URLs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Relative paths under the asset root only.
    SameOrigin,
    /// Any readable local source.
    #[default]
    Anonymous,
}

/// Where image bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Filesystem path, relative paths resolve against the asset root.
    Path(PathBuf),
    /// URL-like identifier, resolved at load time.
    Url(String),
    /// Already-fetched encoded bytes.
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    /// Short human-readable description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(p) => p.display().to_string(),
            ImageSource::Url(u) => u.clone(),
            ImageSource::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for ImageSource {
    fn from(s: &str) -> Self {
        if s.contains("://") {
            ImageSource::Url(s.to_string())
        } else {
            ImageSource::Path(PathBuf::from(s))
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(p: PathBuf) -> Self {
        ImageSource::Path(p)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes.into())
    }
}

/// Read encoded image bytes for `source`, enforcing `mode`.
pub fn read_source(source: &ImageSource, mode: FetchMode, root: &Path) -> ScatterResult<Vec<u8>> {
    match source {
        ImageSource::Bytes(b) => Ok(b.to_vec()),
        ImageSource::Path(p) => read_path(p, mode, root),
        ImageSource::Url(u) => {
            let (scheme, rest) = u
                .split_once("://")
                .ok_or_else(|| ScatterError::load(format!("malformed url '{u}'")))?;
            if !scheme.eq_ignore_ascii_case("file") {
                return Err(ScatterError::load(format!(
                    "unsupported url scheme '{scheme}' (only local sources are fetched)"
                )));
            }
            read_path(Path::new(rest), mode, root)
        }
    }
}

fn read_path(path: &Path, mode: FetchMode, root: &Path) -> ScatterResult<Vec<u8>> {
    let resolved = match mode {
        FetchMode::Anonymous => {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            }
        }
        FetchMode::SameOrigin => {
            let rel = path.to_string_lossy();
            let norm = normalize_rel_path(&rel)?;
            root.join(Path::new(&norm))
        }
    };

    std::fs::read(&resolved).map_err(|e| {
        ScatterError::load(format!(
            "failed to read image '{}': {e}",
            resolved.display()
        ))
    })
}

/// Normalize a same-origin relative path: forward slashes, no `.`/empty segments, no `..`.
pub fn normalize_rel_path(source: &str) -> ScatterResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ScatterError::load(
            "same-origin sources must be relative to the asset root",
        ));
    }
    if s.is_empty() {
        return Err(ScatterError::load("source path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ScatterError::load(
                "same-origin sources must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ScatterError::load("source path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
