//! Checksum sidecar files uploaded next to each artifact.

use hoist_util::hash::ChecksumAlgorithm;

/// A checksum file to upload alongside `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidecar {
    pub path: String,
    pub algorithm: ChecksumAlgorithm,
    pub content: String,
}

/// Compute every sidecar for the file at repository path `path`.
///
/// The content is the bare lowercase hex digest, as Maven writes it.
pub fn sidecars(path: &str, data: &[u8]) -> Vec<Sidecar> {
    ChecksumAlgorithm::ALL
        .iter()
        .map(|&algorithm| Sidecar {
            path: format!("{path}.{}", algorithm.extension()),
            algorithm,
            content: algorithm.hex_digest(data),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_sidecar_per_algorithm() {
        let files = sidecars("g/a/1.0/a-1.0.jar", b"hello world");
        let paths: Vec<_> = files.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "g/a/1.0/a-1.0.jar.md5",
                "g/a/1.0/a-1.0.jar.sha1",
                "g/a/1.0/a-1.0.jar.sha256",
                "g/a/1.0/a-1.0.jar.sha512",
            ]
        );
        assert_eq!(files[0].content, "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(
            files[2].content,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }
}
