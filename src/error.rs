// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

use std::error;
use std::fmt;

use crate::pkcs11::*;

use log::debug;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    origin: Option<Box<dyn error::Error + Send + Sync>>,
    errmsg: Option<String>,
    ckrv: CK_RV,
    call: Option<&'static str>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /* The module returned a non-OK status, see ckrv and call */
    CkError,
    /* The attribute name is not in the registry, see errmsg */
    UnknownAttribute,
    /* The value kind does not match the attribute definition */
    UnsupportedValueKind,
    /* Wrong byte width for the attribute kind */
    LengthMismatch,
    /* Well sized but malformed value (bad UTF-8, impossible date, ...) */
    ValueInvalid,
    /* GCM tag length not among the allowed values */
    InvalidTagLength,
    /* Mechanism parameter or request argument rejected before any call */
    InvalidParameter,
    /* The module sent back something that does not match the request */
    ProtocolViolation,
    /* Object class or certificate type with no typed view */
    UnrecognizedObjectType,
    /* Operation call without a prior init */
    NotInitialized,
    /* init or once while an operation is active */
    AlreadyInitialized,
    /* Other error, see origin */
    Nested,
}

impl Error {
    fn with_kind(kind: ErrorKind, ckrv: CK_RV, errmsg: String) -> Error {
        Error {
            kind: kind,
            origin: None,
            errmsg: Some(errmsg),
            ckrv: ckrv,
            call: None,
        }
    }

    pub fn ck_rv(ckrv: CK_RV) -> Error {
        Error {
            kind: ErrorKind::CkError,
            origin: None,
            errmsg: None,
            ckrv: ckrv,
            call: None,
        }
    }

    /// A failed native call, `call` is the PKCS #11 function name
    pub fn ck_call(call: &'static str, ckrv: CK_RV) -> Error {
        debug!("{} returned {:#x}", call, ckrv);
        Error {
            kind: ErrorKind::CkError,
            origin: None,
            errmsg: None,
            ckrv: ckrv,
            call: Some(call),
        }
    }

    pub fn unknown_attribute(name: &str) -> Error {
        Self::with_kind(
            ErrorKind::UnknownAttribute,
            CKR_ATTRIBUTE_TYPE_INVALID,
            name.to_string(),
        )
    }

    pub fn unsupported_kind(errmsg: String) -> Error {
        Self::with_kind(
            ErrorKind::UnsupportedValueKind,
            CKR_ATTRIBUTE_VALUE_INVALID,
            errmsg,
        )
    }

    pub fn length_mismatch(errmsg: String) -> Error {
        Self::with_kind(
            ErrorKind::LengthMismatch,
            CKR_ATTRIBUTE_VALUE_INVALID,
            errmsg,
        )
    }

    pub fn value_invalid(errmsg: String) -> Error {
        Self::with_kind(
            ErrorKind::ValueInvalid,
            CKR_ATTRIBUTE_VALUE_INVALID,
            errmsg,
        )
    }

    pub fn invalid_tag_length(bits: CK_ULONG) -> Error {
        Self::with_kind(
            ErrorKind::InvalidTagLength,
            CKR_MECHANISM_PARAM_INVALID,
            format!("tag length of {} bits is not allowed", bits),
        )
    }

    pub fn invalid_parameter(errmsg: String) -> Error {
        Self::with_kind(
            ErrorKind::InvalidParameter,
            CKR_ARGUMENTS_BAD,
            errmsg,
        )
    }

    pub fn protocol(errmsg: String) -> Error {
        Self::with_kind(
            ErrorKind::ProtocolViolation,
            CKR_DEVICE_ERROR,
            errmsg,
        )
    }

    pub fn unrecognized(
        class: CK_OBJECT_CLASS,
        subtype: Option<CK_ULONG>,
    ) -> Error {
        let errmsg = match subtype {
            Some(s) => format!("class {:#x} with subtype {:#x}", class, s),
            None => format!("class {:#x}", class),
        };
        Self::with_kind(
            ErrorKind::UnrecognizedObjectType,
            CKR_GENERAL_ERROR,
            errmsg,
        )
    }

    pub fn not_initialized() -> Error {
        Self::with_kind(
            ErrorKind::NotInitialized,
            CKR_OPERATION_NOT_INITIALIZED,
            String::from("operation not initialized"),
        )
    }

    pub fn already_initialized() -> Error {
        Self::with_kind(
            ErrorKind::AlreadyInitialized,
            CKR_OPERATION_ACTIVE,
            String::from("operation already initialized"),
        )
    }

    pub fn other_error<E>(error: E) -> Error
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Error {
            kind: ErrorKind::Nested,
            origin: Some(error.into()),
            errmsg: None,
            ckrv: CKR_GENERAL_ERROR,
            call: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn rv(&self) -> CK_RV {
        self.ckrv
    }

    /// The PKCS #11 function that failed, for CkError
    pub fn call(&self) -> Option<&'static str> {
        self.call
    }

    pub fn errmsg(&self) -> Option<&str> {
        self.errmsg.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = self.errmsg.as_deref().unwrap_or("");
        match self.kind {
            ErrorKind::CkError => {
                if let Some(call) = self.call {
                    write!(f, "{} failed: ", call)?;
                }
                match rv_name(self.ckrv) {
                    Some(name) => write!(f, "{}", name),
                    None => write!(f, "{:#x}", self.ckrv),
                }
            }
            ErrorKind::UnknownAttribute => {
                write!(f, "unknown attribute: {}", msg)
            }
            ErrorKind::UnsupportedValueKind => {
                write!(f, "unsupported value kind: {}", msg)
            }
            ErrorKind::LengthMismatch => write!(f, "length mismatch: {}", msg),
            ErrorKind::ValueInvalid => write!(f, "invalid value: {}", msg),
            ErrorKind::InvalidTagLength => write!(f, "{}", msg),
            ErrorKind::InvalidParameter => {
                write!(f, "invalid parameter: {}", msg)
            }
            ErrorKind::ProtocolViolation => {
                write!(f, "protocol violation: {}", msg)
            }
            ErrorKind::UnrecognizedObjectType => {
                write!(f, "unrecognized object type: {}", msg)
            }
            ErrorKind::NotInitialized | ErrorKind::AlreadyInitialized => {
                write!(f, "{}", msg)
            }
            ErrorKind::Nested => match self.origin {
                Some(ref e) => write!(f, "{}", e),
                None => write!(f, "{}", msg),
            },
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.origin {
            Some(ref e) => Some(e.as_ref()),
            None => None,
        }
    }
}

impl From<CK_RV> for Error {
    fn from(error: CK_RV) -> Error {
        Error::ck_rv(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::other_error(error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Error {
        Error::other_error(error)
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(error: std::num::TryFromIntError) -> Error {
        Error::other_error(error)
    }
}

impl From<std::array::TryFromSliceError> for Error {
    fn from(error: std::array::TryFromSliceError) -> Error {
        Error::other_error(error)
    }
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Error {
        Error::other_error(error)
    }
}

/// Turns a native status into a Result, tagging failures with the call name
#[macro_export]
macro_rules! check_rv {
    ($rv:expr, $call:expr) => {
        match $rv {
            $crate::pkcs11::CKR_OK => Ok(()),
            rv => Err($crate::error::Error::ck_call($call, rv)),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_call() {
        let e = Error::ck_call("C_SignFinal", CKR_KEY_HANDLE_INVALID);
        assert_eq!(e.kind(), ErrorKind::CkError);
        assert_eq!(e.call(), Some("C_SignFinal"));
        assert_eq!(format!("{}", e), "C_SignFinal failed: CKR_KEY_HANDLE_INVALID");
        let e = Error::ck_rv(0x8000_0123);
        assert_eq!(format!("{}", e), "0x80000123");
    }

    #[test]
    fn check_rv_macro() {
        assert!(check_rv!(CKR_OK, "C_Digest").is_ok());
        let e = check_rv!(CKR_DATA_LEN_RANGE, "C_Digest").unwrap_err();
        assert_eq!(e.rv(), CKR_DATA_LEN_RANGE);
        assert_eq!(e.call(), Some("C_Digest"));
    }
}
