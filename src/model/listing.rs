/// Result of a directory fetch as seen by the UI layer
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Listing<T> {
    /// Never requested
    #[default]
    Unset,
    Loaded(T),
    Failed(String),
}

impl<T> Listing<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Listing::Loaded(_))
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Listing::Loaded(value) => Some(value),
            _ => None,
        }
    }
}
