use std::fmt;

#[derive(Debug)]
pub enum ResponsiveError {
    InvalidConfiguration(String),
    MissingElement(String),
    Io(std::io::Error),
}

impl fmt::Display for ResponsiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponsiveError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            ResponsiveError::MissingElement(message) => {
                write!(f, "target has no renderable element: {}", message)
            }
            ResponsiveError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ResponsiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResponsiveError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ResponsiveError {
    fn from(value: std::io::Error) -> Self {
        ResponsiveError::Io(value)
    }
}
