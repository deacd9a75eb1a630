use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Cause of a decoding error, one variant per failure class.
#[derive(Debug, Clone)]
pub enum ParquetErrorCause {
    /// Missing magic bytes, bad footer length, malformed file structure.
    Format,
    /// The file is valid parquet but uses a feature outside the flat-schema
    /// read path (encryption, nesting, data page v2, exotic codecs, ...).
    Unsupported,
    /// The metadata and the payload disagree: overlong string lengths,
    /// out-of-range RLE values, short streams, dictionary misuse.
    Corrupt,
    /// Footer or page-header deserialization failure.
    Thrift(Arc<parquet_format_safe::thrift::Error>),
    /// Snappy rejected a page payload.
    Decompress(Arc<snap::Error>),
    Io(Arc<std::io::Error>),
}

impl ParquetErrorCause {
    pub fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParquetErrorCause::Thrift(err) => Some(err.as_ref()),
            ParquetErrorCause::Decompress(err) => Some(err.as_ref()),
            ParquetErrorCause::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    #[track_caller]
    pub fn into_err(self) -> ParquetError {
        ParquetError::new(self)
    }
}

/// An error raised while opening or scanning a parquet file.
///
/// The reader's metadata stays valid after a failed scan; the `ScanState`
/// and `ResultChunk` involved in the failing call do not.
#[derive(Debug, Clone)]
pub struct ParquetError {
    cause: ParquetErrorCause,

    /// Stack of additional contextual information, printed in reverse order.
    context: Vec<String>,

    backtrace: Arc<Backtrace>,
}

impl ParquetError {
    #[track_caller]
    pub fn new(cause: ParquetErrorCause) -> Self {
        Self {
            cause,
            context: Vec::new(),
            backtrace: Backtrace::capture().into(),
        }
    }

    #[track_caller]
    pub fn with_descr(cause: ParquetErrorCause, descr: impl Into<String>) -> Self {
        Self {
            cause,
            context: vec![descr.into()],
            backtrace: Backtrace::capture().into(),
        }
    }

    pub fn cause(&self) -> &ParquetErrorCause {
        &self.cause
    }
}

impl Display for ParquetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let source = self.cause.source();
        for (index, context) in self.context.iter().rev().enumerate() {
            if index > 0 {
                write!(f, ": ")?;
            }
            write!(f, "{}", context)?;
        }
        if let Some(source) = source {
            if self.context.is_empty() {
                write!(f, "{}", source)?;
            } else {
                write!(f, ": {}", source)?;
            }
        } else if self.context.is_empty() {
            write!(f, "{:?} error", self.cause)?;
        }

        if let BacktraceStatus::Captured = &self.backtrace.status() {
            write!(f, "\n{:?}", self.backtrace)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParquetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.source()
    }
}

impl From<parquet_format_safe::thrift::Error> for ParquetError {
    fn from(source: parquet_format_safe::thrift::Error) -> Self {
        Self::new(ParquetErrorCause::Thrift(Arc::new(source)))
    }
}

impl From<snap::Error> for ParquetError {
    fn from(source: snap::Error) -> Self {
        Self::new(ParquetErrorCause::Decompress(Arc::new(source)))
    }
}

impl From<std::io::Error> for ParquetError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ParquetErrorCause::Io(Arc::new(e)))
    }
}

pub type ParquetResult<T> = Result<T, ParquetError>;

pub trait ParquetErrorExt<T> {
    fn context(self, context: &str) -> Self;
    fn with_context<F>(self, context: F) -> Self
    where
        F: FnOnce(&mut ParquetError) -> String;
}

impl<T> ParquetErrorExt<T> for ParquetResult<T> {
    fn context(self, context: &str) -> Self {
        match self {
            Ok(val) => Ok(val),
            Err(mut err) => {
                err.context.push(context.to_string());
                Err(err)
            }
        }
    }

    fn with_context<F>(self, context: F) -> Self
    where
        F: FnOnce(&mut ParquetError) -> String,
    {
        match self {
            Ok(val) => Ok(val),
            Err(mut err) => {
                let context = context(&mut err);
                err.context.push(context);
                Err(err)
            }
        }
    }
}

macro_rules! fmt_err {
    ($cause: ident, $($arg:tt)*) => {
        $crate::error::ParquetError::with_descr(
            $crate::error::ParquetErrorCause::$cause,
            format!($($arg)*))
    };
}

pub(crate) use fmt_err;
