use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// MaxRects free-rectangle choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    /// Minimize the shorter leftover side of the chosen free rect.
    BestShortSideFit,
    /// Minimize the longer leftover side.
    BestLongSideFit,
    /// Minimize leftover area.
    BestAreaFit,
    /// Prefer the lowest, then leftmost, placement.
    BottomLeftRule,
    /// Maximize boundary contact with the bin edges and placed rects.
    ContactPointRule,
}

impl FromStr for Heuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "blr" | "bottomleftrule" => Ok(Self::BottomLeftRule),
            "cpr" | "contactpointrule" => Ok(Self::ContactPointRule),
            _ => Err(()),
        }
    }
}

/// String encoding used by the binary sidecar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    /// Raw bytes followed by a NUL terminator.
    NullTerminated,
    /// Little-endian `int16` byte length, then the bytes.
    Prefix16,
    /// Little-endian base-128 varint byte length, then the bytes.
    Prefix7,
}

impl StringFormat {
    /// The byte written into the binary sidecar header.
    pub fn code(self) -> u8 {
        match self {
            Self::NullTerminated => 0,
            Self::Prefix16 => 1,
            Self::Prefix7 => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NullTerminated),
            1 => Some(Self::Prefix16),
            2 => Some(Self::Prefix7),
            _ => None,
        }
    }
}

impl FromStr for StringFormat {
    type Err = ();
    /// Parses the CLI spelling: `0`, `16` or `7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Self::NullTerminated),
            "16" => Ok(Self::Prefix16),
            "7" => Ok(Self::Prefix7),
            _ => Err(()),
        }
    }
}

/// Packing configuration threaded through the driver and packers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Maximum page width in pixels.
    pub max_width: u32,
    /// Maximum page height in pixels.
    pub max_height: u32,
    /// Pixels reserved to the right/bottom of every placement.
    pub padding: u32,
    /// Edge-replication halo around each bitmap's pixels.
    pub stretch: u32,

    /// Premultiply color channels by alpha on load.
    pub premultiply: bool,
    /// Coalesce bitmaps with identical pixel content.
    pub unique: bool,
    /// Trim transparent borders on load.
    pub trim: bool,
    /// Allow 90° clockwise rotation for placements.
    pub rotate: bool,

    #[serde(default = "default_heuristic")]
    pub heuristic: Heuristic,
    #[serde(default = "default_string_format")]
    pub string_format: StringFormat,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_width: 4096,
            max_height: 4096,
            padding: 1,
            stretch: 0,
            premultiply: false,
            unique: false,
            trim: false,
            rotate: false,
            heuristic: default_heuristic(),
            string_format: default_string_format(),
        }
    }
}

/// Padding and stretch are capped so a halo can never swallow a whole page.
pub const MAX_PADDING: u32 = 16;
pub const MAX_STRETCH: u32 = 16;

impl AtlasConfig {
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::CrunchError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(CrunchError::InvalidConfig(format!(
                "atlas dimensions must be positive (got {}x{})",
                self.max_width, self.max_height
            )));
        }
        if self.padding > MAX_PADDING {
            return Err(CrunchError::InvalidConfig(format!(
                "padding must be between 0 and {} (got {})",
                MAX_PADDING, self.padding
            )));
        }
        if self.stretch > MAX_STRETCH {
            return Err(CrunchError::InvalidConfig(format!(
                "stretch must be between 0 and {} (got {})",
                MAX_STRETCH, self.stretch
            )));
        }
        Ok(())
    }
}

fn default_heuristic() -> Heuristic {
    Heuristic::BestShortSideFit
}
fn default_string_format() -> StringFormat {
    StringFormat::NullTerminated
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn stretch(mut self, v: u32) -> Self {
        self.cfg.stretch = v;
        self
    }
    pub fn premultiply(mut self, v: bool) -> Self {
        self.cfg.premultiply = v;
        self
    }
    pub fn unique(mut self, v: bool) -> Self {
        self.cfg.unique = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.cfg.trim = v;
        self
    }
    pub fn rotate(mut self, v: bool) -> Self {
        self.cfg.rotate = v;
        self
    }
    pub fn heuristic(mut self, v: Heuristic) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn string_format(mut self, v: StringFormat) -> Self {
        self.cfg.string_format = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
