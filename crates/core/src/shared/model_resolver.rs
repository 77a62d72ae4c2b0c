use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Decompression chunk size.
const DECOMPRESS_CHUNK: usize = 100 * 1024;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error(
        "model unavailable: download failed for {url}: {source}. \
         Download it manually from {url}, decompress it if it ends in .bz2, \
         and place it at {path}"
    )]
    Unavailable {
        url: String,
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decompress {path}: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file by name, checking cache locations before downloading.
///
/// Resolution order:
/// 1. User cache directory (platform-specific)
/// 2. Bundled path (for development / pre-packaged installs)
/// 3. Download from URL to cache
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = bundled_dir {
        let bundled_path = dir.join(name);
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    ensure_model(&cached_path, url, progress)
}

/// Makes sure a model exists at `path`, downloading it from `url` once.
///
/// Existing files are returned untouched without any network access.
/// URLs ending in `.bz2` are fetched into a compressed intermediate next
/// to `path`, stream-decompressed, and the intermediate is removed.
pub fn ensure_model(
    path: &Path,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    log::info!("Downloading model {} from {url}", path.display());
    let result = if is_bzip2(url) {
        let compressed = with_suffix(path, "bz2");
        let result = download(url, path, &compressed, progress)
            .and_then(|_| decompress_bz2(&compressed, path));
        let _ = fs::remove_file(&compressed);
        result
    } else {
        download(url, path, path, progress)
    };

    if let Err(e) = &result {
        if matches!(e, ModelResolveError::Unavailable { .. }) {
            log::error!("{e}");
        }
    }
    result.map(|_| path.to_path_buf())
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/SmileCheck/models/`
/// - Linux: `$XDG_CACHE_HOME/SmileCheck/models/` or `~/.cache/SmileCheck/models/`
/// - Windows: `%LOCALAPPDATA%/SmileCheck/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("SmileCheck").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("SmileCheck").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn is_bzip2(url: &str) -> bool {
    url.to_ascii_lowercase().ends_with(".bz2")
}

/// `model.onnx` + `bz2` -> `model.onnx.bz2`.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Downloads `url` into `dest`. `target` is the final model path the
/// operator should use when installing manually.
fn download(
    url: &str,
    target: &Path,
    dest: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let temp_path = with_suffix(dest, "part");

    let result = download_inner(url, target, dest, &temp_path, progress);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    target: &Path,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let unavailable = |source: reqwest::Error| ModelResolveError::Unavailable {
        url: url.to_string(),
        path: target.to_path_buf(),
        source,
    };
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(unavailable)?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let mut file = fs::File::create(temp_path).map_err(|e| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    })?;

    let mut reader = response;
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| ModelResolveError::Write {
                path: temp_path.to_path_buf(),
                source: e,
            })?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| ModelResolveError::Write {
                path: temp_path.to_path_buf(),
                source: e,
            })?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    })?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

/// Stream-decompresses a bzip2 file into `dest` in fixed-size chunks.
///
/// Output goes to `dest.part` first and is renamed on success, so a
/// failed run never leaves a truncated model behind.
pub fn decompress_bz2(src: &Path, dest: &Path) -> Result<(), ModelResolveError> {
    let temp_path = with_suffix(dest, "part");
    let result = decompress_inner(src, dest, &temp_path);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn decompress_inner(src: &Path, dest: &Path, temp_path: &Path) -> Result<(), ModelResolveError> {
    let decompress_err = |e| ModelResolveError::Decompress {
        path: src.to_path_buf(),
        source: e,
    };
    let write_err = |e| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    };

    let input = fs::File::open(src).map_err(decompress_err)?;
    let mut decoder = bzip2::read::BzDecoder::new(std::io::BufReader::new(input));
    let mut output = fs::File::create(temp_path).map_err(write_err)?;

    let mut buf = vec![0u8; DECOMPRESS_CHUNK];
    loop {
        let n = decoder.read(&mut buf).map_err(decompress_err)?;
        if n == 0 {
            break;
        }
        output.write_all(&buf[..n]).map_err(write_err)?;
    }
    output.flush().map_err(write_err)?;
    drop(output);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}
