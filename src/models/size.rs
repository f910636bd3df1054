use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const MIN_DIMENSION: u32 = 1024;
pub const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizePreset {
    #[default]
    Square2048,
    Landscape4x3,
    Portrait3x4,
    Landscape16x9,
    Portrait9x16,
    Landscape3x2,
    Portrait2x3,
    Wide21x9,
    Square4096,
    Custom,
}

impl SizePreset {
    pub const ALL: [SizePreset; 10] = [
        SizePreset::Square2048,
        SizePreset::Landscape4x3,
        SizePreset::Portrait3x4,
        SizePreset::Landscape16x9,
        SizePreset::Portrait9x16,
        SizePreset::Landscape3x2,
        SizePreset::Portrait2x3,
        SizePreset::Wide21x9,
        SizePreset::Square4096,
        SizePreset::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SizePreset::Square2048 => "2048x2048 (1:1)",
            SizePreset::Landscape4x3 => "2304x1728 (4:3)",
            SizePreset::Portrait3x4 => "1728x2304 (3:4)",
            SizePreset::Landscape16x9 => "2560x1440 (16:9)",
            SizePreset::Portrait9x16 => "1440x2560 (9:16)",
            SizePreset::Landscape3x2 => "2496x1664 (3:2)",
            SizePreset::Portrait2x3 => "1664x2496 (2:3)",
            SizePreset::Wide21x9 => "3024x1296 (21:9)",
            SizePreset::Square4096 => "4096x4096 (1:1)",
            SizePreset::Custom => "Custom",
        }
    }

    /// `(width, height, aspect_ratio)` for a fixed preset, `None` for `Custom`.
    pub fn dimensions(&self) -> Option<(u32, u32, &'static str)> {
        match self {
            SizePreset::Square2048 => Some((2048, 2048, "1:1")),
            SizePreset::Landscape4x3 => Some((2304, 1728, "4:3")),
            SizePreset::Portrait3x4 => Some((1728, 2304, "3:4")),
            SizePreset::Landscape16x9 => Some((2560, 1440, "16:9")),
            SizePreset::Portrait9x16 => Some((1440, 2560, "9:16")),
            SizePreset::Landscape3x2 => Some((2496, 1664, "3:2")),
            SizePreset::Portrait2x3 => Some((1664, 2496, "2:3")),
            SizePreset::Wide21x9 => Some((3024, 1296, "21:9")),
            SizePreset::Square4096 => Some((4096, 4096, "1:1")),
            SizePreset::Custom => None,
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SizePreset::ALL
            .iter()
            .copied()
            .find(|preset| preset.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let labels: Vec<&str> = SizePreset::ALL.iter().map(|p| p.label()).collect();
                format!(
                    "unknown size preset '{}', expected one of: {}",
                    wanted,
                    labels.join(", ")
                )
            })
    }
}

/// API-facing size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiSize {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
    #[serde(rename = "custom")]
    Custom,
}

impl ApiSize {
    pub fn classify(width: u32, height: u32) -> Self {
        match (width, height) {
            (1024, 1024) => ApiSize::OneK,
            (2048, 2048) => ApiSize::TwoK,
            (4096, 4096) => ApiSize::FourK,
            _ => ApiSize::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiSize::OneK => "1K",
            ApiSize::TwoK => "2K",
            ApiSize::FourK => "4K",
            ApiSize::Custom => "custom",
        }
    }
}

impl fmt::Display for ApiSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSize {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: Option<&'static str>,
    pub api_size: ApiSize,
}

impl ResolvedSize {
    /// Presets override the caller's dimensions; `Custom` keeps them as given.
    pub fn resolve(preset: SizePreset, width: u32, height: u32) -> Self {
        let (width, height, aspect_ratio) = match preset.dimensions() {
            Some((w, h, aspect)) => (w, h, Some(aspect)),
            None => (width, height, None),
        };

        ResolvedSize {
            width,
            height,
            aspect_ratio,
            api_size: ApiSize::classify(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_override_caller_dimensions() {
        let expected = [
            (SizePreset::Square2048, 2048, 2048, "1:1"),
            (SizePreset::Landscape4x3, 2304, 1728, "4:3"),
            (SizePreset::Portrait3x4, 1728, 2304, "3:4"),
            (SizePreset::Landscape16x9, 2560, 1440, "16:9"),
            (SizePreset::Portrait9x16, 1440, 2560, "9:16"),
            (SizePreset::Landscape3x2, 2496, 1664, "3:2"),
            (SizePreset::Portrait2x3, 1664, 2496, "2:3"),
            (SizePreset::Wide21x9, 3024, 1296, "21:9"),
            (SizePreset::Square4096, 4096, 4096, "1:1"),
        ];

        for (preset, width, height, aspect) in expected {
            let resolved = ResolvedSize::resolve(preset, 1088, 3200);
            assert_eq!(resolved.width, width, "{}", preset);
            assert_eq!(resolved.height, height, "{}", preset);
            assert_eq!(resolved.aspect_ratio, Some(aspect), "{}", preset);
        }
    }

    #[test]
    fn test_custom_keeps_dimensions() {
        let resolved = ResolvedSize::resolve(SizePreset::Custom, 1088, 3200);
        assert_eq!((resolved.width, resolved.height), (1088, 3200));
        assert_eq!(resolved.aspect_ratio, None);
        assert_eq!(resolved.api_size, ApiSize::Custom);
    }

    #[test]
    fn test_size_classification() {
        assert_eq!(ApiSize::classify(1024, 1024), ApiSize::OneK);
        assert_eq!(ApiSize::classify(2048, 2048), ApiSize::TwoK);
        assert_eq!(ApiSize::classify(4096, 4096), ApiSize::FourK);
        assert_eq!(ApiSize::classify(2304, 1728), ApiSize::Custom);
        assert_eq!(ApiSize::classify(1024, 2048), ApiSize::Custom);
    }

    #[test]
    fn test_preset_labels_parse() {
        for preset in SizePreset::ALL {
            assert_eq!(preset.label().parse::<SizePreset>().unwrap(), preset);
        }
        assert_eq!("custom".parse::<SizePreset>().unwrap(), SizePreset::Custom);
        assert!("800x600".parse::<SizePreset>().is_err());
    }

    #[test]
    fn test_api_size_serializes_as_label() {
        assert_eq!(serde_json::to_string(&ApiSize::TwoK).unwrap(), "\"2K\"");
        assert_eq!(serde_json::to_string(&ApiSize::Custom).unwrap(), "\"custom\"");
    }
}
