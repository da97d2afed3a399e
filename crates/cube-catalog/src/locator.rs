//! Storage locators for cube stores.
//!
//! The catalog publishes cubes as virtual-hosted S3 HTTP URLs
//! (`http://<bucket>.s3.amazonaws.com/<key>`). The cube opener reads them
//! through the S3 API, so those URLs are rewritten to `s3://<bucket>/<key>`.
//! This is a pure string transform.

use std::fmt;
use std::path::PathBuf;

const S3_HOST_SUFFIX: &str = ".s3.amazonaws.com";

/// Normalised address of a cube's backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageLocator {
    /// Object in an S3 bucket, read anonymously.
    S3 { bucket: String, key: String },
    /// Any other HTTP(S) endpoint.
    Http { url: String },
    /// A store on the local filesystem.
    Local(PathBuf),
}

impl StorageLocator {
    /// Rewrite a catalog `zarr_url` into a locator.
    pub fn from_catalog_url(url: &str) -> Self {
        let url = url.trim();

        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, key) = split_once_or_all(rest);
            return StorageLocator::S3 {
                bucket: bucket.to_string(),
                key: key.trim_end_matches('/').to_string(),
            };
        }

        let without_scheme = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"));

        match without_scheme {
            Some(rest) => {
                let (host, key) = split_once_or_all(rest);
                match host.strip_suffix(S3_HOST_SUFFIX) {
                    Some(bucket) if !bucket.is_empty() => StorageLocator::S3 {
                        bucket: bucket.to_string(),
                        key: key.trim_end_matches('/').to_string(),
                    },
                    _ => StorageLocator::Http {
                        url: url.trim_end_matches('/').to_string(),
                    },
                }
            }
            None => {
                let path = url.strip_prefix("file://").unwrap_or(url);
                StorageLocator::Local(PathBuf::from(path))
            }
        }
    }

    /// True when opening requires network access.
    pub fn is_remote(&self) -> bool {
        !matches!(self, StorageLocator::Local(_))
    }
}

fn split_once_or_all(s: &str) -> (&str, &str) {
    s.split_once('/').unwrap_or((s, ""))
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocator::S3 { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
            StorageLocator::Http { url } => write!(f, "{}", url),
            StorageLocator::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
