//! Widget naming
//!
//! Unnamed widgets get a generated name of the form `"{prefix} {n}"`.
//! Smart replace needs to tell those apart from names a user chose, so each
//! name is classified once into a [`NameKind`].

/// How a widget is identified when matching
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// The user gave the widget a distinguishing name
    Custom(String),
    /// Identified by its position among tracked widgets of its view
    Positional(usize),
}

/// Generates and recognises default widget names
#[derive(Debug, Clone)]
pub struct DefaultNamer {
    prefix: String,
}

impl DefaultNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Default name for the widget at `ordinal` (0-based) within its view
    pub fn default_name(&self, ordinal: usize) -> String {
        format!("{} {}", self.prefix, ordinal + 1)
    }

    /// Whether `name` is absent or follows the generated pattern
    pub fn is_default(&self, name: Option<&str>) -> bool {
        let Some(name) = name.map(str::trim) else {
            return true;
        };
        if name.is_empty() || name == self.prefix {
            return true;
        }
        match name.strip_prefix(self.prefix.as_str()) {
            Some(rest) => {
                let digits = rest.trim_start();
                rest.len() > digits.len()
                    && !digits.is_empty()
                    && digits.chars().all(|c| c.is_ascii_digit())
            }
            None => false,
        }
    }

    /// Classify a widget by its name, using `ordinal` when the name is generated
    pub fn classify(&self, name: Option<&str>, ordinal: usize) -> NameKind {
        match name {
            Some(name) if !self.is_default(Some(name)) => NameKind::Custom(name.trim().to_string()),
            _ => NameKind::Positional(ordinal),
        }
    }
}
