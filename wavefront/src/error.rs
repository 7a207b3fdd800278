use thiserror::Error;

// only two things can actually go wrong;
// everything else (mtllib, groups, dropped attributes) is just a log notice
#[derive(Debug, Error)]
pub enum WavefrontError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    // line 0 means the problem is in the mesh handed to the writer, not in a file
    #[error("malformed obj at line {line}: {message}")]
    Format { line: usize, message: String },
}

impl WavefrontError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WavefrontError>;
