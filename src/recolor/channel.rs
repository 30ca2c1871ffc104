use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MaskChannel {
    #[default]
    Unknown,
    Red,
    Alpha,
}

impl MaskChannel {
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "RED" => Self::Red,
            "ALPHA" => Self::Alpha,
            "UNKNOWN" | "" => Self::Unknown,
            other => {
                tracing::warn!(value = other, "unrecognized mask_channel, using RED");
                Self::Unknown
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Red => "RED",
            Self::Alpha => "ALPHA",
        }
    }

    pub fn shader_component(self) -> char {
        match self {
            Self::Unknown | Self::Red => 'r',
            Self::Alpha => 'a',
        }
    }
}

impl From<String> for MaskChannel {
    fn from(s: String) -> Self {
        Self::parse_lossy(&s)
    }
}

impl From<MaskChannel> for String {
    fn from(c: MaskChannel) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for MaskChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn select_mask_channel(channel: MaskChannel, channel_count: usize) -> usize {
    if channel_count <= 1 {
        return 0;
    }
    match channel {
        MaskChannel::Alpha => channel_count - 1,
        MaskChannel::Red | MaskChannel::Unknown => 0,
    }
}
