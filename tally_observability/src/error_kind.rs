/// Categories of errors for classification and handling.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration, needs operator fix
    Configuration,

    /// Invalid input, client error
    Validation,

    /// The service is not accepting work, e.g. while shutting down
    Unavailable,

    /// Network/IO errors, retry possible
    Temporary,

    /// Bugs, system errors
    Internal,
}

impl ErrorKind {
    /// Standard exit code for this error category.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Configuration => 78, // EX_CONFIG
            Self::Validation => 64,    // EX_USAGE
            Self::Temporary => 75,     // EX_TEMPFAIL
            Self::Unavailable => 69,   // EX_UNAVAILABLE
            Self::Internal => 70,      // EX_SOFTWARE
        }
    }
}
