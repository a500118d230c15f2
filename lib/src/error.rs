/// All possible composition and dispatch errors
#[derive(Debug)]
pub enum Error {
    /// A template placeholder has no matching image or table entry
    UnresolvedPlaceholder(String),
    /// An image value could not be turned into (bytes, subtype)
    UnsupportedImageSource(String),
    /// The receiver list resolved to no addresses
    EmptyRecipients,
    /// Conflicting or incomplete builder input
    Configuration(String),
    /// The template engine rejected a body
    Template(String),
    Io(String),
    Smtp(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::UnresolvedPlaceholder(ref name) => {
                write!(f, "UnresolvedPlaceholder: {}", name)
            }
            Error::UnsupportedImageSource(ref msg) => {
                write!(f, "UnsupportedImageSource: {}", msg)
            }
            Error::EmptyRecipients => f.write_str("EmptyRecipients"),
            Error::Configuration(ref msg) => write!(f, "Configuration: {}", msg),
            Error::Template(ref msg) => write!(f, "Template: {}", msg),
            Error::Io(ref msg) => write!(f, "Io: {}", msg),
            Error::Smtp(ref msg) => write!(f, "Smtp: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<tera::Error> for Error {
    fn from(err: tera::Error) -> Self {
        Error::Template(err.to_string())
    }
}

impl From<lettre::smtp::error::Error> for Error {
    fn from(err: lettre::smtp::error::Error) -> Self {
        Error::Smtp(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}
