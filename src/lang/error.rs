use super::LineNumber;

pub struct Error {
    code: u16,
    line_number: LineNumber,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line_number: None,
            message: "",
        }
    }

    pub fn is_direct(&self) -> bool {
        self.line_number.is_none()
    }

    pub fn in_line_number(&self, line: LineNumber) -> Error {
        debug_assert!(self.line_number.is_none());
        Error {
            code: self.code,
            line_number: line,
            message: self.message,
        }
    }

    pub fn message(&self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            code: self.code,
            line_number: self.line_number,
            message,
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }
}

pub enum ErrorCode {
    NextWithoutFor = 1,
    SyntaxError = 2,
    ReturnWithoutGosub = 3,
    IllegalFunctionCall = 5,
    Overflow = 6,
    OutOfMemory = 7,
    UndefinedLine = 8,
    DivisionByZero = 11,
    TypeMismatch = 13,
    FormulaTooComplex = 16,
    UndefinedFunction = 18,
    LineBufferOverflow = 23,
    LoopWithoutDo = 30,
    Break = 40,
    InternalError = 51,
    FileNotFound = 53,
    StorageError = 57,
    BadFileName = 64,
    DirectStatementInFile = 66,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            1 => "NEXT WITHOUT FOR",
            2 => "SYNTAX ERROR",
            3 => "RETURN WITHOUT GOSUB",
            5 => "ILLEGAL FUNCTION CALL",
            6 => "OVERFLOW",
            7 => "OUT OF MEMORY",
            8 => "UNDEFINED LINE",
            11 => "DIVISION BY ZERO",
            13 => "TYPE MISMATCH",
            16 => "FORMULA TOO COMPLEX",
            18 => "UNDEFINED FUNCTION",
            23 => "LINE BUFFER OVERFLOW",
            30 => "LOOP WITHOUT DO",
            40 => "BREAK",
            51 => "INTERNAL ERROR",
            53 => "FILE NOT FOUND",
            57 => "STORAGE ERROR",
            64 => "BAD FILE NAME",
            66 => "DIRECT STATEMENT IN FILE",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" {}", line_number));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            if suffix.is_empty() {
                write!(f, "?PROGRAM ERROR {}", self.code)
            } else {
                write!(f, "?PROGRAM ERROR {} IN{}", self.code, suffix)
            }
        } else if suffix.is_empty() {
            write!(f, "?{}", code_str)
        } else {
            write!(f, "?{} IN{}", code_str, suffix)
        }
    }
}
