//! Category icon interpretation.

/// How a category's icon string should be displayed.
///
/// The backend stores icons as plain text: either a short glyph (usually an
/// emoji) or an image URL. No tag is persisted, so the kind is decided at use
/// time: text starting with `http` or `/` is an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryIcon<'a> {
    /// Render as an image loaded from this URL or path.
    Image(&'a str),
    /// Render the text directly.
    Glyph(&'a str),
}

impl<'a> CategoryIcon<'a> {
    /// Classify a stored icon value.
    #[must_use]
    pub fn classify(icon: &'a str) -> Self {
        if icon.starts_with("http") || icon.starts_with('/') {
            Self::Image(icon)
        } else {
            Self::Glyph(icon)
        }
    }

    /// Whether the icon is an image reference.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// The raw stored value.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        match self {
            Self::Image(s) | Self::Glyph(s) => s,
        }
    }
}
