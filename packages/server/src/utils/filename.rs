use crate::error::AppError;

/// Longest accepted file name, in characters.
pub const MAX_FILE_NAME_CHARS: usize = 255;

/// Why a file name was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum FileNameError {
    Empty,
    TooLong,
    /// `/` or `\` would turn the name into a nested path.
    ContainsPathSeparator,
    /// `.` or `..` on its own.
    DotSegment,
    NullByte,
    /// CR, LF, tab and friends.
    ControlCharacter,
}

impl FileNameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "File name cannot be empty",
            Self::TooLong => "File name must be at most 255 characters",
            Self::ContainsPathSeparator => "Invalid file name: path separators are not allowed",
            Self::DotSegment => "Invalid file name: '.' and '..' are not allowed",
            Self::NullByte => "Invalid file name: null bytes are not allowed",
            Self::ControlCharacter => "Invalid file name: control characters are not allowed",
        }
    }
}

impl From<FileNameError> for AppError {
    fn from(err: FileNameError) -> Self {
        AppError::Validation(err.message().into())
    }
}

/// Validate a project file name and return it trimmed.
///
/// Names are flat: they become the last segment of the blob path.
/// Dotfiles such as `.gitignore` are allowed.
pub fn validate_file_name(name: &str) -> Result<&str, FileNameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(FileNameError::Empty);
    }
    if trimmed.chars().count() > MAX_FILE_NAME_CHARS {
        return Err(FileNameError::TooLong);
    }
    if trimmed.contains('\0') {
        return Err(FileNameError::NullByte);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FileNameError::ControlCharacter);
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FileNameError::ContainsPathSeparator);
    }
    if trimmed == "." || trimmed == ".." {
        return Err(FileNameError::DotSegment);
    }

    Ok(trimmed)
}
