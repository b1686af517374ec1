use thiserror::Error;

/// Errors produced while locating, reading, tokenizing or typing inlists
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported file type: {extension}")]
    UnsupportedFileType { extension: String },

    #[error("No parser available for: {extension}")]
    NoParserAvailable { extension: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid syntax on line {line}: {message}")]
    InvalidSyntax { line: usize, message: String },

    #[error("No closing quotation (opened on line {line})")]
    UnterminatedQuote { line: usize },

    #[error("Invalid literal '{text}': {message}")]
    InvalidLiteral { text: String, message: String },

    #[error("Cannot type value '{value}' of '{key}': {message}")]
    Typing {
        key: String,
        value: String,
        message: String,
    },

    #[error("No defaults file can be derived from {path}: it does not follow <dir>/<subdir>/<name>.<ext>")]
    DefaultsPathUnresolved { path: String },

    #[error("Value of '{key}' cannot be written in custom inlist format")]
    Unrepresentable { key: String },
}

impl DomainError {
    pub fn file_not_found<S: Into<String>>(path: S) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn unsupported_file_type<S: Into<String>>(extension: S) -> Self {
        Self::UnsupportedFileType {
            extension: extension.into(),
        }
    }

    pub fn no_parser_available<S: Into<String>>(extension: S) -> Self {
        Self::NoParserAvailable {
            extension: extension.into(),
        }
    }

    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn io_error<S: Into<String>>(message: S) -> Self {
        Self::IoError {
            message: message.into(),
        }
    }

    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn invalid_syntax<S: Into<String>>(line: usize, message: S) -> Self {
        Self::InvalidSyntax {
            line,
            message: message.into(),
        }
    }

    pub fn unterminated_quote(line: usize) -> Self {
        Self::UnterminatedQuote { line }
    }

    pub fn invalid_literal<T: Into<String>, M: Into<String>>(text: T, message: M) -> Self {
        Self::InvalidLiteral {
            text: text.into(),
            message: message.into(),
        }
    }

    pub fn typing<K, V, M>(key: K, value: V, message: M) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        M: Into<String>,
    {
        Self::Typing {
            key: key.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn defaults_path_unresolved<S: Into<String>>(path: S) -> Self {
        Self::DefaultsPathUnresolved { path: path.into() }
    }

    pub fn unrepresentable<S: Into<String>>(key: S) -> Self {
        Self::Unrepresentable { key: key.into() }
    }

    /// Map a filesystem error for `path`, keeping "not found" distinct
    pub fn from_io(path: &std::path::Path, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::file_not_found(path.display().to_string())
        } else {
            Self::io_error(format!("Failed to read {}: {}", path.display(), err))
        }
    }
}
