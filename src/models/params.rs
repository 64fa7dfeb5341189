use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum prompt length, counted in characters.
pub const PROMPT_LIMIT: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "image-to-image")]
    ImageToImage,
    #[serde(rename = "text-to-image")]
    TextToImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "nano-banana-pro")]
    Pro,
    #[serde(rename = "nano-banana")]
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1k")]
    OneK,
    #[default]
    #[serde(rename = "2k")]
    TwoK,
    #[serde(rename = "4k")]
    FourK,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "5:4")]
    Landscape5x4,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "21:9")]
    Ultrawide21x9,
}

/// Wire names double as the `Display`/`FromStr` form so CLI values and JSON agree.
macro_rules! wire_names {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let value = value.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value))
                    .ok_or_else(|| {
                        let known: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown {} '{}', expected one of {}", $what, value, known.join(", "))
                    })
            }
        }
    };
}

wire_names!(Mode, "mode", {
    ImageToImage => "image-to-image",
    TextToImage => "text-to-image",
});

wire_names!(Model, "model", {
    Pro => "nano-banana-pro",
    Standard => "nano-banana",
});

wire_names!(Resolution, "resolution", {
    OneK => "1k",
    TwoK => "2k",
    FourK => "4k",
});

wire_names!(AspectRatio, "aspect ratio", {
    Auto => "auto",
    Square => "1:1",
    Portrait9x16 => "9:16",
    Landscape16x9 => "16:9",
    Portrait3x4 => "3:4",
    Landscape4x3 => "4:3",
    Landscape3x2 => "3:2",
    Portrait2x3 => "2:3",
    Landscape5x4 => "5:4",
    Portrait4x5 => "4:5",
    Ultrawide21x9 => "21:9",
});

impl Mode {
    pub fn uses_reference_images(&self) -> bool {
        matches!(self, Mode::ImageToImage)
    }
}

impl Model {
    pub fn label(&self) -> &'static str {
        match self {
            Model::Pro => "Nano Banana Pro",
            Model::Standard => "Nano Banana",
        }
    }
}

impl AspectRatio {
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Auto => "Auto",
            other => other.as_str(),
        }
    }
}

/// Everything the form sends besides the reference images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    pub mode: Mode,
    pub model: Model,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
    prompt: String,
}

impl GenerationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Stores at most [`PROMPT_LIMIT`] characters; anything past the cap is
    /// never registered. Returns how many characters were refused.
    pub fn set_prompt(&mut self, value: &str) -> usize {
        let total = value.chars().count();
        self.prompt = match value.char_indices().nth(PROMPT_LIMIT) {
            Some((cut, _)) => value[..cut].to_string(),
            None => value.to_string(),
        };
        total.saturating_sub(PROMPT_LIMIT)
    }

    pub fn prompt_len(&self) -> usize {
        self.prompt.chars().count()
    }

    pub fn prompt_counter(&self) -> String {
        format!("{}/{}", self.prompt_len(), PROMPT_LIMIT)
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.set_prompt(prompt);
        self
    }
}
