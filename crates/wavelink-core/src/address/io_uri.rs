// SPDX-FileCopyrightText: © 2025 Wavelink Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! I/O URI: addresses audio devices and files at the external-collaborator
//! boundary (sound cards, file codecs). Distinct from [`super::network_uri`]
//! because it never carries a protocol-registry entry, port, or query.

use super::pct::{pct_decode, pct_encode, PctMode};

/// A parsed I/O URI: `scheme://name`, or one of the `file:` forms.
#[derive(Debug, Clone, Default)]
pub struct IoUri {
    scheme: String,
    path: String,
}

impl IoUri {
    /// Both scheme and path must be present for an I/O URI to be valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.scheme.is_empty() && !self.path.is_empty()
    }

    /// True if this is a `file:` URI.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.is_valid() && self.scheme == "file"
    }

    /// True if this is the stdio sentinel (`file:-` / `file://-`).
    #[must_use]
    pub fn is_special_file(&self) -> bool {
        self.is_file() && self.path == "-"
    }

    /// The URI scheme, e.g. `device` or `file`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The decoded path or device name.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Percent-encoded form of [`IoUri::path`].
    #[must_use]
    pub fn format_encoded_path(&self) -> Option<String> {
        pct_encode(self.path.as_bytes(), PctMode::NonPath)
    }

    /// Parses one of the recognized I/O URI forms. Fragment and query are
    /// rejected outright (returns `None`) rather than tolerated as broken
    /// fields, since this type has no ternary field-state model.
    #[must_use]
    pub fn parse(input: &str) -> Option<IoUri> {
        if input.contains('#') || input.contains('?') {
            return None;
        }

        if let Some(rest) = input.strip_prefix("file://") {
            if rest == "-" {
                return Some(IoUri {
                    scheme: "file".to_string(),
                    path: "-".to_string(),
                });
            }
            // "file:///ABS/PATH" (empty host) and "file://localhost/ABS/PATH"
            // (explicit localhost) are both absolute-path forms.
            let path = if let Some(p) = rest.strip_prefix('/') {
                p
            } else {
                rest.strip_prefix("localhost/")?
            };
            let decoded = decode_path(path)?;
            return Some(IoUri {
                scheme: "file".to_string(),
                path: format!("/{decoded}"),
            });
        }

        if let Some(rest) = input.strip_prefix("file:") {
            if rest == "-" {
                return Some(IoUri {
                    scheme: "file".to_string(),
                    path: "-".to_string(),
                });
            }
            let decoded = decode_path(rest)?;
            return Some(IoUri {
                scheme: "file".to_string(),
                path: decoded,
            });
        }

        let (scheme, rest) = input.split_once("://")?;
        if scheme.is_empty() || rest.is_empty() {
            return None;
        }
        let decoded = pct_decode(rest).and_then(|b| String::from_utf8(b).ok())?;
        Some(IoUri {
            scheme: scheme.to_string(),
            path: decoded,
        })
    }
}

fn decode_path(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    pct_decode(raw).and_then(|b| String::from_utf8(b).ok())
}
