use std::{borrow::Cow, fmt};

pub type PostScriptResult<T> = anyhow::Result<T>;

/// Error categories visible to PostScript programs.
///
/// These are the Level 1 error names the interpreter can raise while
/// executing an operator. The user-visible rendering is a single line of
/// the form `<kind> in --<op>--` with an optional `: detail` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operand stack underflow
    StackUnderflow,

    /// Operand stack overflow
    StackOverflow,

    /// Operand of wrong type
    TypeCheck,

    /// Operand out of bounds
    RangeCheck,

    /// Name not known
    Undefined,

    /// Virtual memory exhausted
    VmError,

    /// Attempt to violate access attribute, e.g. a write into the system
    /// dictionary
    InvalidAccess,

    /// Too many end operators
    DictStackUnderflow,

    /// Current point undefined
    NoCurrentPoint,

    /// PostScript language syntax error
    SyntaxError,

    /// A language feature the interpreter does not implement, such as
    /// Base-85 strings or executing a string as a program
    Unsupported,

    /// Expected mark not on stack
    UnmatchedMark,
}

impl ErrorKind {
    fn name(self) -> &'static str {
        match self {
            ErrorKind::StackUnderflow => "stackunderflow",
            ErrorKind::StackOverflow => "stackoverflow",
            ErrorKind::TypeCheck => "typecheck",
            ErrorKind::RangeCheck => "rangecheck",
            ErrorKind::Undefined => "undefined",
            ErrorKind::VmError => "VMerror",
            ErrorKind::InvalidAccess => "invalidaccess",
            ErrorKind::DictStackUnderflow => "dictstackunderflow",
            ErrorKind::NoCurrentPoint => "nocurrentpoint",
            ErrorKind::SyntaxError => "syntaxerror",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::UnmatchedMark => "unmatchedmark",
        }
    }
}

#[derive(Debug)]
pub struct PostScriptError {
    kind: ErrorKind,
    operator: Cow<'static, str>,
    detail: Option<String>,
}

impl PostScriptError {
    pub fn new(kind: ErrorKind, operator: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            operator: operator.into(),
            detail: None,
        }
    }

    pub fn with_detail(
        kind: ErrorKind,
        operator: impl Into<Cow<'static, str>>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operator: operator.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for PostScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in --{}--", self.kind.name(), self.operator)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }

        Ok(())
    }
}

impl std::error::Error for PostScriptError {}

/// Scanner errors travel on their own channel, carrying the position at
/// which tokenization failed.
#[derive(Debug)]
pub struct ScanError {
    pub column: usize,
    pub row: usize,
    pub message: String,
}

impl ScanError {
    pub fn new(column: usize, row: usize, message: impl Into<String>) -> Self {
        Self {
            column,
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}, column {})",
            self.message,
            self.row + 1,
            self.column
        )
    }
}

impl std::error::Error for ScanError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn operator_error_format() {
        let err = PostScriptError::new(ErrorKind::TypeCheck, "add");

        assert_eq!(err.to_string(), "typecheck in --add--");
    }

    #[test]
    fn operator_error_format_with_detail() {
        let err = PostScriptError::with_detail(ErrorKind::RangeCheck, "div", "zero divisor");

        assert_eq!(err.to_string(), "rangecheck in --div--: zero divisor");
    }

    #[test]
    fn undefined_carries_the_name() {
        let err = PostScriptError::new(ErrorKind::Undefined, "florp".to_owned());

        assert_eq!(err.to_string(), "undefined in --florp--");
    }

    #[test]
    fn vm_error_spelling() {
        let err = PostScriptError::new(ErrorKind::VmError, "save");

        assert_eq!(err.to_string(), "VMerror in --save--");
    }
}
