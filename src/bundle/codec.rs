//! Byte encoding of a [`Bundle`]: `<header length>\n<JSON header>\n<file data>`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Bundle;
use crate::error::{PackError, PackResult};

const FORMAT_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
  version: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  main: Option<String>,
  #[serde(default)]
  imports: Map<String, Value>,
  #[serde(default)]
  resolutions: IndexMap<String, Map<String, Value>>,
  #[serde(default)]
  addons: Vec<String>,
  #[serde(default)]
  assets: Vec<String>,
  #[serde(default)]
  files: IndexMap<String, FileRange>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileRange {
  offset: usize,
  length: usize,
}

impl Bundle {
  /// Encode the bundle. Encoding is deterministic for equal bundles.
  pub fn to_bytes(&self) -> PackResult<Vec<u8>> {
    let mut offset = 0;
    let files = self
      .files
      .iter()
      .map(|(path, content)| {
        let range = FileRange {
          offset,
          length: content.len(),
        };
        offset += content.len();
        (path.clone(), range)
      })
      .collect();

    let header = Header {
      version: FORMAT_VERSION,
      main: self.main.clone(),
      imports: self.imports.clone(),
      resolutions: self.resolutions.clone(),
      addons: self.addons.clone(),
      assets: self.assets.clone(),
      files,
    };
    let header = serde_json::to_vec(&header)
      .map_err(|err| PackError::MalformedBundle(format!("failed to encode header: {err}")))?;

    let mut out = Vec::with_capacity(header.len() + offset + 24);
    out.extend_from_slice(header.len().to_string().as_bytes());
    out.push(b'\n');
    out.extend_from_slice(&header);
    out.push(b'\n');
    for content in self.files.values() {
      out.extend_from_slice(content);
    }
    Ok(out)
  }

  /// Decode a bundle produced by [`Bundle::to_bytes`].
  pub fn from_bytes(bytes: &[u8]) -> PackResult<Self> {
    let newline = bytes
      .iter()
      .position(|byte| *byte == b'\n')
      .ok_or_else(|| malformed("missing header length"))?;
    let length: usize = std::str::from_utf8(&bytes[..newline])
      .ok()
      .and_then(|text| text.parse().ok())
      .ok_or_else(|| malformed("header length is not a number"))?;

    let header_start = newline + 1;
    let header_end = header_start
      .checked_add(length)
      .filter(|end| *end < bytes.len() && bytes[*end] == b'\n')
      .ok_or_else(|| malformed("header is truncated"))?;
    let header: Header = serde_json::from_slice(&bytes[header_start..header_end])
      .map_err(|err| malformed(&format!("invalid header: {err}")))?;
    if header.version != FORMAT_VERSION {
      return Err(malformed(&format!("unsupported version {}", header.version)));
    }

    let data = &bytes[header_end + 1..];
    let mut files = IndexMap::with_capacity(header.files.len());
    for (path, range) in header.files {
      let content = range
        .offset
        .checked_add(range.length)
        .and_then(|end| data.get(range.offset..end))
        .ok_or_else(|| malformed(&format!("file {path} lies outside the bundle")))?;
      files.insert(path, content.to_vec());
    }

    Ok(Self {
      main: header.main,
      imports: header.imports,
      resolutions: header.resolutions,
      addons: header.addons,
      assets: header.assets,
      files,
    })
  }
}

fn malformed(message: &str) -> PackError {
  PackError::MalformedBundle(message.to_string())
}
