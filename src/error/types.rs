//! Error types
//!
//! Defines domain-specific error types for each module of the file server.

use std::fmt;
use std::io;
use std::process::ExitStatus;

/// Why a client-supplied path was refused by the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRejection {
    Empty,
    Absolute,
    OutsideRoot,
    EmptyName,
    InvalidCharacters,
    ReservedCharacter(char),
    NameTooLong { length: usize, max: usize },
}

impl fmt::Display for PathRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRejection::Empty => write!(f, "File name cannot be empty."),
            PathRejection::Absolute => write!(f, "Absolute paths are not allowed."),
            PathRejection::OutsideRoot => {
                write!(f, "Invalid file name. Directory traversal is not allowed.")
            }
            PathRejection::EmptyName => write!(f, "Path does not name a file or folder."),
            PathRejection::InvalidCharacters => write!(
                f,
                "Invalid file name. Only alphanumeric characters, underscores, hyphens, dots, and spaces are allowed."
            ),
            PathRejection::ReservedCharacter(c) => {
                write!(f, "Invalid file name. Reserved character '{}' is not allowed.", c)
            }
            PathRejection::NameTooLong { length, max } => write!(
                f,
                "File name is too long ({} characters, maximum {}).",
                length, max
            ),
        }
    }
}

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    InvalidPath(PathRejection),
    NotFound(String),
    Conflict(String),
    Locked(String),
    InsufficientStorage { required: u64, available: u64 },
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidPath(reason) => write!(f, "{}", reason),
            StorageError::NotFound(p) => write!(f, "File not found: {}", p),
            StorageError::Conflict(p) => write!(f, "File already exists: {}", p),
            StorageError::Locked(p) => write!(f, "Path is locked by another operation: {}", p),
            StorageError::InsufficientStorage {
                required,
                available,
            } => write!(
                f,
                "Insufficient storage: {} bytes required, {} bytes available",
                required, available
            ),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

impl From<PathRejection> for StorageError {
    fn from(reason: PathRejection) -> Self {
        StorageError::InvalidPath(reason)
    }
}

/// Malformed or incomplete upload requests
#[derive(Debug)]
pub enum RequestError {
    MissingHeader(&'static str),
    LengthRequired,
    InvalidInput(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingHeader(h) => write!(f, "No {} header", h),
            RequestError::LengthRequired => write!(f, "X-File-Size header is required"),
            RequestError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for RequestError {}

/// External archiver failures
#[derive(Debug)]
pub enum ArchiveError {
    Spawn { program: String, source: io::Error },
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    IoError(io::Error),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Spawn { program, source } => {
                write!(f, "Failed to start {}: {}", program, source)
            }
            ArchiveError::ToolFailed {
                program,
                status,
                stderr,
            } => write!(f, "{} exited with {}: {}", program, status, stderr.trim()),
            ArchiveError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ArchiveError {}

impl From<io::Error> for ArchiveError {
    fn from(error: io::Error) -> Self {
        ArchiveError::IoError(error)
    }
}

/// Authentication middleware errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingHeader,
    MalformedHeader,
    InvalidToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "No authorization header provided"),
            AuthError::MalformedHeader => write!(f, "Invalid authorization header format"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for AuthError {}

/// General file server error that encompasses all error types
#[derive(Debug)]
pub enum ServerError {
    Storage(StorageError),
    Request(RequestError),
    Archive(ArchiveError),
    Auth(AuthError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Storage(e) => write!(f, "{}", e),
            ServerError::Request(e) => write!(f, "{}", e),
            ServerError::Archive(e) => write!(f, "Archive error: {}", e),
            ServerError::Auth(e) => write!(f, "{}", e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<PathRejection> for ServerError {
    fn from(reason: PathRejection) -> Self {
        ServerError::Storage(StorageError::InvalidPath(reason))
    }
}

impl From<RequestError> for ServerError {
    fn from(error: RequestError) -> Self {
        ServerError::Request(error)
    }
}

impl From<ArchiveError> for ServerError {
    fn from(error: ArchiveError) -> Self {
        ServerError::Archive(error)
    }
}

impl From<AuthError> for ServerError {
    fn from(error: AuthError) -> Self {
        ServerError::Auth(error)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
