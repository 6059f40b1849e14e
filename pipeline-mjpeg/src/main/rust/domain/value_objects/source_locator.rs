use std::fmt;

/// Transport schemes that deliver a live feed which cannot be rewound.
const LIVE_SCHEMES: &[&str] = &["rtsp", "rtsps", "rtspt", "rtmp", "rtmps", "srt", "udp", "rtp"];

/// How a source behaves once it runs out of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Network feed; running dry means the stream is over.
    Live,
    /// File-like source; rewound to the first frame and replayed forever.
    Finite,
}

impl SourceKind {
    /// Classify a locator by its transport scheme.
    pub fn classify(locator: &str) -> Self {
        match scheme_of(locator) {
            Some(scheme) if LIVE_SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) => {
                SourceKind::Live
            }
            _ => SourceKind::Finite,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Live => "live",
            SourceKind::Finite => "finite",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, SourceKind::Live)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved video origin together with its liveness classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator {
    value: String,
    kind: SourceKind,
}

impl SourceLocator {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into().trim().to_string();
        let kind = SourceKind::classify(&value);
        Self { value, kind }
    }

    /// Resolve a requested locator, substituting `fallback` when the request is blank.
    pub fn resolve(requested: Option<&str>, fallback: &SourceLocator) -> Self {
        match requested.map(str::trim) {
            Some(value) if !value.is_empty() => Self::new(value),
            _ => fallback.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Scheme portion of the locator, if it is URI shaped.
    pub fn scheme(&self) -> Option<&str> {
        scheme_of(&self.value)
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn scheme_of(locator: &str) -> Option<&str> {
    let (scheme, _) = locator.trim().split_once("://")?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}
