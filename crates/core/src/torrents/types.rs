use serde::{Deserialize, Serialize};

/// One downloadable release of a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TorrentDescriptor {
    pub url: String,
    /// Quality label as reported by the index, e.g. "1080p".
    pub quality: String,
    pub size_bytes: u64,
    pub seeds: u32,
    pub peers: u32,
}

/// Quality labels recognized by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "2160p")]
    P2160,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
            Quality::P2160 => "2160p",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_serde_uses_label() {
        assert_eq!(serde_json::to_string(&Quality::P1080).unwrap(), "\"1080p\"");
        let quality: Quality = serde_json::from_str("\"720p\"").unwrap();
        assert_eq!(quality, Quality::P720);
    }
}
