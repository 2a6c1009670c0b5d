use std::error::Error as StdError;
use std::fmt;

/// Native client-API return codes. Mirrors the `MPV_ERROR_*` constants in
/// client.h; any code this build does not know survives as `Unknown`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    Success,
    EventQueueFull,
    Nomem,
    Uninitialized,
    InvalidParameter,
    OptionNotFound,
    OptionFormat,
    OptionError,
    PropertyNotFound,
    PropertyFormat,
    PropertyUnavailable,
    PropertyError,
    Command,
    LoadingFailed,
    AoInitFailed,
    VoInitFailed,
    NothingToPlay,
    UnknownFormat,
    Unsupported,
    NotImplemented,
    Unknown(i32),
}

impl ErrorCode {
    /// Any non-negative return means success.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            value if value >= 0 => ErrorCode::Success,
            -1 => ErrorCode::EventQueueFull,
            -2 => ErrorCode::Nomem,
            -3 => ErrorCode::Uninitialized,
            -4 => ErrorCode::InvalidParameter,
            -5 => ErrorCode::OptionNotFound,
            -6 => ErrorCode::OptionFormat,
            -7 => ErrorCode::OptionError,
            -8 => ErrorCode::PropertyNotFound,
            -9 => ErrorCode::PropertyFormat,
            -10 => ErrorCode::PropertyUnavailable,
            -11 => ErrorCode::PropertyError,
            -12 => ErrorCode::Command,
            -13 => ErrorCode::LoadingFailed,
            -14 => ErrorCode::AoInitFailed,
            -15 => ErrorCode::VoInitFailed,
            -16 => ErrorCode::NothingToPlay,
            -17 => ErrorCode::UnknownFormat,
            -18 => ErrorCode::Unsupported,
            -19 => ErrorCode::NotImplemented,
            other => ErrorCode::Unknown(other),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::EventQueueFull => -1,
            ErrorCode::Nomem => -2,
            ErrorCode::Uninitialized => -3,
            ErrorCode::InvalidParameter => -4,
            ErrorCode::OptionNotFound => -5,
            ErrorCode::OptionFormat => -6,
            ErrorCode::OptionError => -7,
            ErrorCode::PropertyNotFound => -8,
            ErrorCode::PropertyFormat => -9,
            ErrorCode::PropertyUnavailable => -10,
            ErrorCode::PropertyError => -11,
            ErrorCode::Command => -12,
            ErrorCode::LoadingFailed => -13,
            ErrorCode::AoInitFailed => -14,
            ErrorCode::VoInitFailed => -15,
            ErrorCode::NothingToPlay => -16,
            ErrorCode::UnknownFormat => -17,
            ErrorCode::Unsupported => -18,
            ErrorCode::NotImplemented => -19,
            ErrorCode::Unknown(raw) => raw,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    LibraryNotLoaded,
    VersionMismatch,
    Native,
    AccessDenied,
    UnknownProperty,
    UnsupportedValue,
    EventLoop,
    Uninitialized,
    Usage,
    Io,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    function: Option<String>,
    code: Option<ErrorCode>,
    args: Vec<String>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            function: None,
            code: None,
            args: Vec::new(),
            hint: None,
            source: None,
        }
    }

    /// A failed native call: the call name, the negative return code, the
    /// engine's reason text, and the stringified argument list.
    pub fn native(
        function: impl Into<String>,
        code: ErrorCode,
        reason: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self::new(ErrorKind::Native)
            .with_message(reason)
            .with_function(function)
            .with_code(code)
            .with_args(args)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(function) = &self.function {
            write!(f, " (function: {function})")?;
        }
        if let Some(code) = self.code {
            write!(f, " (code: {})", code.as_raw())?;
        }
        if !self.args.is_empty() {
            write!(f, " (args: {:?})", self.args)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::LibraryNotLoaded => 3,
        ErrorKind::VersionMismatch => 4,
        ErrorKind::Native => 5,
        ErrorKind::AccessDenied => 6,
        ErrorKind::UnknownProperty => 7,
        ErrorKind::UnsupportedValue => 8,
        ErrorKind::EventLoop => 9,
        ErrorKind::Uninitialized => 10,
        ErrorKind::Io => 11,
    }
}
