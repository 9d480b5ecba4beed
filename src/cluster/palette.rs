use crate::SiteError;
use static_assertions::const_assert;

/// The colors handed out to clusters when no other palette is configured.
pub const DEFAULT_COLORS: [&str; 8] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
];

const_assert!(DEFAULT_COLORS.len() > 0);

/// An ordered list of display colors for clusters.
///
/// Cluster i gets color i modulo the length of the palette, so any number of clusters can be
/// colored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<String>);

impl Palette {
    pub fn new<S: Into<String>>(colors: Vec<S>) -> Result<Self, SiteError> {
        if colors.is_empty() {
            return Err(SiteError::InvalidParameter(
                "the cluster color palette must contain at least one color".to_owned(),
            ));
        }

        Ok(Palette(colors.into_iter().map(Into::into).collect()))
    }

    /// The color for the cluster at index.
    pub fn color(&self, index: usize) -> &str {
        &self.0[index % self.0.len()]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette(DEFAULT_COLORS.iter().map(|&c| c.to_owned()).collect())
    }
}
