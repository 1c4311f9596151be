use thiserror::Error;

/// Errors raised while building a dot plot.
///
/// Only conditions that make the global axis untrustworthy are fatal.
/// Missing attributes and unresolved hits are recovered where they occur
/// and show up in the loader/assembler diagnostics instead.
#[derive(Error, Debug)]
pub enum DotplotError {
    /// A start/stop field did not parse to an integer after cleaning.
    #[error("malformed {field} coordinate {value:?} for gene {gene} on {chromosome}")]
    MalformedCoordinate {
        chromosome: String,
        gene: String,
        field: &'static str,
        value: String,
    },

    /// Placing an element or feature on the global axis overflowed u64.
    #[error("global coordinate overflow while placing {element}")]
    CoordinateOverflow { element: String },

    /// An annotated feature lacks the requested identifier attribute.
    #[error("attribute {attribute:?} not found")]
    MissingAttribute { attribute: String },

    /// Nothing usable to lay out or to project.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A line is structurally broken (too few columns and the like).
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("could not build thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, DotplotError>;

impl DotplotError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Whether the run has to stop on this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingAttribute { .. })
    }
}
