// Copyright 2023 Simo Sorce
// See LICENSE.txt file for terms

//! The subset of the PKCS #11 vocabulary used by p11client.
//!
//! Values follow the OASIS PKCS #11 3.1 base and current mechanisms
//! specifications. Only plain types and numeric identifiers live here,
//! there are no function pointers and no structures: buffers crossing the
//! module boundary are encoded by p11client itself.

#![allow(non_camel_case_types)]

/// The native `unsigned long` of the target platform
pub type CK_ULONG = std::os::raw::c_ulong;
pub type CK_LONG = std::os::raw::c_long;
pub type CK_BYTE = u8;
pub type CK_BBOOL = CK_BYTE;
pub type CK_FLAGS = CK_ULONG;
pub type CK_RV = CK_ULONG;
pub type CK_SESSION_HANDLE = CK_ULONG;
pub type CK_OBJECT_HANDLE = CK_ULONG;
pub type CK_OBJECT_CLASS = CK_ULONG;
pub type CK_KEY_TYPE = CK_ULONG;
pub type CK_CERTIFICATE_TYPE = CK_ULONG;
pub type CK_CERTIFICATE_CATEGORY = CK_ULONG;
pub type CK_ATTRIBUTE_TYPE = CK_ULONG;
pub type CK_MECHANISM_TYPE = CK_ULONG;
pub type CK_RSA_PKCS_MGF_TYPE = CK_ULONG;
pub type CK_RSA_PKCS_OAEP_SOURCE_TYPE = CK_ULONG;
pub type CK_EC_KDF_TYPE = CK_ULONG;
pub type CK_JAVA_MIDP_SECURITY_DOMAIN = CK_ULONG;

pub const CK_TRUE: CK_BBOOL = 1;
pub const CK_FALSE: CK_BBOOL = 0;

pub const CK_INVALID_HANDLE: CK_ULONG = 0;
pub const CK_UNAVAILABLE_INFORMATION: CK_ULONG = CK_ULONG::MAX;
pub const CK_EFFECTIVELY_INFINITE: CK_ULONG = 0;

/* Object classes */
pub const CKO_DATA: CK_OBJECT_CLASS = 0x0000_0000;
pub const CKO_CERTIFICATE: CK_OBJECT_CLASS = 0x0000_0001;
pub const CKO_PUBLIC_KEY: CK_OBJECT_CLASS = 0x0000_0002;
pub const CKO_PRIVATE_KEY: CK_OBJECT_CLASS = 0x0000_0003;
pub const CKO_SECRET_KEY: CK_OBJECT_CLASS = 0x0000_0004;
pub const CKO_HW_FEATURE: CK_OBJECT_CLASS = 0x0000_0005;
pub const CKO_DOMAIN_PARAMETERS: CK_OBJECT_CLASS = 0x0000_0006;
pub const CKO_MECHANISM: CK_OBJECT_CLASS = 0x0000_0007;
pub const CKO_OTP_KEY: CK_OBJECT_CLASS = 0x0000_0008;
pub const CKO_PROFILE: CK_OBJECT_CLASS = 0x0000_0009;
pub const CKO_VENDOR_DEFINED: CK_OBJECT_CLASS = 0x8000_0000;

/* Certificate types */
pub const CKC_X_509: CK_CERTIFICATE_TYPE = 0x0000_0000;
pub const CKC_X_509_ATTR_CERT: CK_CERTIFICATE_TYPE = 0x0000_0001;
pub const CKC_WTLS: CK_CERTIFICATE_TYPE = 0x0000_0002;
pub const CKC_VENDOR_DEFINED: CK_CERTIFICATE_TYPE = 0x8000_0000;

pub const CK_CERTIFICATE_CATEGORY_UNSPECIFIED: CK_ULONG = 0;
pub const CK_CERTIFICATE_CATEGORY_TOKEN_USER: CK_ULONG = 1;
pub const CK_CERTIFICATE_CATEGORY_AUTHORITY: CK_ULONG = 2;
pub const CK_CERTIFICATE_CATEGORY_OTHER_ENTITY: CK_ULONG = 3;

pub const CK_SECURITY_DOMAIN_UNSPECIFIED: CK_ULONG = 0;
pub const CK_SECURITY_DOMAIN_MANUFACTURER: CK_ULONG = 1;
pub const CK_SECURITY_DOMAIN_OPERATOR: CK_ULONG = 2;
pub const CK_SECURITY_DOMAIN_THIRD_PARTY: CK_ULONG = 3;

/* Key types */
pub const CKK_RSA: CK_KEY_TYPE = 0x0000_0000;
pub const CKK_DSA: CK_KEY_TYPE = 0x0000_0001;
pub const CKK_DH: CK_KEY_TYPE = 0x0000_0002;
pub const CKK_EC: CK_KEY_TYPE = 0x0000_0003;
pub const CKK_X9_42_DH: CK_KEY_TYPE = 0x0000_0004;
pub const CKK_GENERIC_SECRET: CK_KEY_TYPE = 0x0000_0010;
pub const CKK_DES3: CK_KEY_TYPE = 0x0000_0015;
pub const CKK_AES: CK_KEY_TYPE = 0x0000_001F;
pub const CKK_EC_EDWARDS: CK_KEY_TYPE = 0x0000_0040;
pub const CKK_EC_MONTGOMERY: CK_KEY_TYPE = 0x0000_0041;
pub const CKK_VENDOR_DEFINED: CK_KEY_TYPE = 0x8000_0000;

/* Attributes */
pub const CKF_ARRAY_ATTRIBUTE: CK_FLAGS = 0x4000_0000;

pub const CKA_CLASS: CK_ATTRIBUTE_TYPE = 0x0000_0000;
pub const CKA_TOKEN: CK_ATTRIBUTE_TYPE = 0x0000_0001;
pub const CKA_PRIVATE: CK_ATTRIBUTE_TYPE = 0x0000_0002;
pub const CKA_LABEL: CK_ATTRIBUTE_TYPE = 0x0000_0003;
pub const CKA_UNIQUE_ID: CK_ATTRIBUTE_TYPE = 0x0000_0004;
pub const CKA_APPLICATION: CK_ATTRIBUTE_TYPE = 0x0000_0010;
pub const CKA_VALUE: CK_ATTRIBUTE_TYPE = 0x0000_0011;
pub const CKA_OBJECT_ID: CK_ATTRIBUTE_TYPE = 0x0000_0012;
pub const CKA_CERTIFICATE_TYPE: CK_ATTRIBUTE_TYPE = 0x0000_0080;
pub const CKA_ISSUER: CK_ATTRIBUTE_TYPE = 0x0000_0081;
pub const CKA_SERIAL_NUMBER: CK_ATTRIBUTE_TYPE = 0x0000_0082;
pub const CKA_AC_ISSUER: CK_ATTRIBUTE_TYPE = 0x0000_0083;
pub const CKA_OWNER: CK_ATTRIBUTE_TYPE = 0x0000_0084;
pub const CKA_ATTR_TYPES: CK_ATTRIBUTE_TYPE = 0x0000_0085;
pub const CKA_TRUSTED: CK_ATTRIBUTE_TYPE = 0x0000_0086;
pub const CKA_CERTIFICATE_CATEGORY: CK_ATTRIBUTE_TYPE = 0x0000_0087;
pub const CKA_JAVA_MIDP_SECURITY_DOMAIN: CK_ATTRIBUTE_TYPE = 0x0000_0088;
pub const CKA_URL: CK_ATTRIBUTE_TYPE = 0x0000_0089;
pub const CKA_HASH_OF_SUBJECT_PUBLIC_KEY: CK_ATTRIBUTE_TYPE = 0x0000_008A;
pub const CKA_HASH_OF_ISSUER_PUBLIC_KEY: CK_ATTRIBUTE_TYPE = 0x0000_008B;
pub const CKA_NAME_HASH_ALGORITHM: CK_ATTRIBUTE_TYPE = 0x0000_008C;
pub const CKA_CHECK_VALUE: CK_ATTRIBUTE_TYPE = 0x0000_0090;
pub const CKA_KEY_TYPE: CK_ATTRIBUTE_TYPE = 0x0000_0100;
pub const CKA_SUBJECT: CK_ATTRIBUTE_TYPE = 0x0000_0101;
pub const CKA_ID: CK_ATTRIBUTE_TYPE = 0x0000_0102;
pub const CKA_SENSITIVE: CK_ATTRIBUTE_TYPE = 0x0000_0103;
pub const CKA_ENCRYPT: CK_ATTRIBUTE_TYPE = 0x0000_0104;
pub const CKA_DECRYPT: CK_ATTRIBUTE_TYPE = 0x0000_0105;
pub const CKA_WRAP: CK_ATTRIBUTE_TYPE = 0x0000_0106;
pub const CKA_UNWRAP: CK_ATTRIBUTE_TYPE = 0x0000_0107;
pub const CKA_SIGN: CK_ATTRIBUTE_TYPE = 0x0000_0108;
pub const CKA_SIGN_RECOVER: CK_ATTRIBUTE_TYPE = 0x0000_0109;
pub const CKA_VERIFY: CK_ATTRIBUTE_TYPE = 0x0000_010A;
pub const CKA_VERIFY_RECOVER: CK_ATTRIBUTE_TYPE = 0x0000_010B;
pub const CKA_DERIVE: CK_ATTRIBUTE_TYPE = 0x0000_010C;
pub const CKA_START_DATE: CK_ATTRIBUTE_TYPE = 0x0000_0110;
pub const CKA_END_DATE: CK_ATTRIBUTE_TYPE = 0x0000_0111;
pub const CKA_MODULUS: CK_ATTRIBUTE_TYPE = 0x0000_0120;
pub const CKA_MODULUS_BITS: CK_ATTRIBUTE_TYPE = 0x0000_0121;
pub const CKA_PUBLIC_EXPONENT: CK_ATTRIBUTE_TYPE = 0x0000_0122;
pub const CKA_PRIVATE_EXPONENT: CK_ATTRIBUTE_TYPE = 0x0000_0123;
pub const CKA_PRIME_1: CK_ATTRIBUTE_TYPE = 0x0000_0124;
pub const CKA_PRIME_2: CK_ATTRIBUTE_TYPE = 0x0000_0125;
pub const CKA_EXPONENT_1: CK_ATTRIBUTE_TYPE = 0x0000_0126;
pub const CKA_EXPONENT_2: CK_ATTRIBUTE_TYPE = 0x0000_0127;
pub const CKA_COEFFICIENT: CK_ATTRIBUTE_TYPE = 0x0000_0128;
pub const CKA_PUBLIC_KEY_INFO: CK_ATTRIBUTE_TYPE = 0x0000_0129;
pub const CKA_PRIME: CK_ATTRIBUTE_TYPE = 0x0000_0130;
pub const CKA_SUBPRIME: CK_ATTRIBUTE_TYPE = 0x0000_0131;
pub const CKA_BASE: CK_ATTRIBUTE_TYPE = 0x0000_0132;
pub const CKA_PRIME_BITS: CK_ATTRIBUTE_TYPE = 0x0000_0133;
pub const CKA_SUBPRIME_BITS: CK_ATTRIBUTE_TYPE = 0x0000_0134;
pub const CKA_VALUE_BITS: CK_ATTRIBUTE_TYPE = 0x0000_0160;
pub const CKA_VALUE_LEN: CK_ATTRIBUTE_TYPE = 0x0000_0161;
pub const CKA_EXTRACTABLE: CK_ATTRIBUTE_TYPE = 0x0000_0162;
pub const CKA_LOCAL: CK_ATTRIBUTE_TYPE = 0x0000_0163;
pub const CKA_NEVER_EXTRACTABLE: CK_ATTRIBUTE_TYPE = 0x0000_0164;
pub const CKA_ALWAYS_SENSITIVE: CK_ATTRIBUTE_TYPE = 0x0000_0165;
pub const CKA_KEY_GEN_MECHANISM: CK_ATTRIBUTE_TYPE = 0x0000_0166;
pub const CKA_MODIFIABLE: CK_ATTRIBUTE_TYPE = 0x0000_0170;
pub const CKA_COPYABLE: CK_ATTRIBUTE_TYPE = 0x0000_0171;
pub const CKA_DESTROYABLE: CK_ATTRIBUTE_TYPE = 0x0000_0172;
pub const CKA_EC_PARAMS: CK_ATTRIBUTE_TYPE = 0x0000_0180;
pub const CKA_EC_POINT: CK_ATTRIBUTE_TYPE = 0x0000_0181;
pub const CKA_ALWAYS_AUTHENTICATE: CK_ATTRIBUTE_TYPE = 0x0000_0202;
pub const CKA_WRAP_WITH_TRUSTED: CK_ATTRIBUTE_TYPE = 0x0000_0210;
pub const CKA_WRAP_TEMPLATE: CK_ATTRIBUTE_TYPE = CKF_ARRAY_ATTRIBUTE | 0x211;
pub const CKA_UNWRAP_TEMPLATE: CK_ATTRIBUTE_TYPE = CKF_ARRAY_ATTRIBUTE | 0x212;
pub const CKA_DERIVE_TEMPLATE: CK_ATTRIBUTE_TYPE = CKF_ARRAY_ATTRIBUTE | 0x213;
pub const CKA_ALLOWED_MECHANISMS: CK_ATTRIBUTE_TYPE =
    CKF_ARRAY_ATTRIBUTE | 0x600;
pub const CKA_VENDOR_DEFINED: CK_ATTRIBUTE_TYPE = 0x8000_0000;

/* Mechanisms */
pub const CKM_RSA_PKCS_KEY_PAIR_GEN: CK_MECHANISM_TYPE = 0x0000_0000;
pub const CKM_RSA_PKCS: CK_MECHANISM_TYPE = 0x0000_0001;
pub const CKM_RSA_X_509: CK_MECHANISM_TYPE = 0x0000_0003;
pub const CKM_SHA1_RSA_PKCS: CK_MECHANISM_TYPE = 0x0000_0006;
pub const CKM_RSA_PKCS_OAEP: CK_MECHANISM_TYPE = 0x0000_0009;
pub const CKM_RSA_PKCS_PSS: CK_MECHANISM_TYPE = 0x0000_000D;
pub const CKM_SHA1_RSA_PKCS_PSS: CK_MECHANISM_TYPE = 0x0000_000E;
pub const CKM_SHA256_RSA_PKCS: CK_MECHANISM_TYPE = 0x0000_0040;
pub const CKM_SHA256_RSA_PKCS_PSS: CK_MECHANISM_TYPE = 0x0000_0043;
pub const CKM_MD5: CK_MECHANISM_TYPE = 0x0000_0210;
pub const CKM_SHA_1: CK_MECHANISM_TYPE = 0x0000_0220;
pub const CKM_SHA_1_HMAC: CK_MECHANISM_TYPE = 0x0000_0221;
pub const CKM_SHA256: CK_MECHANISM_TYPE = 0x0000_0250;
pub const CKM_SHA256_HMAC: CK_MECHANISM_TYPE = 0x0000_0251;
pub const CKM_SHA224: CK_MECHANISM_TYPE = 0x0000_0255;
pub const CKM_SHA384: CK_MECHANISM_TYPE = 0x0000_0260;
pub const CKM_SHA512: CK_MECHANISM_TYPE = 0x0000_0270;
pub const CKM_GENERIC_SECRET_KEY_GEN: CK_MECHANISM_TYPE = 0x0000_0350;
pub const CKM_EC_KEY_PAIR_GEN: CK_MECHANISM_TYPE = 0x0000_1040;
pub const CKM_ECDSA: CK_MECHANISM_TYPE = 0x0000_1041;
pub const CKM_ECDSA_SHA256: CK_MECHANISM_TYPE = 0x0000_1044;
pub const CKM_ECDH1_DERIVE: CK_MECHANISM_TYPE = 0x0000_1050;
pub const CKM_ECDH1_COFACTOR_DERIVE: CK_MECHANISM_TYPE = 0x0000_1051;
pub const CKM_AES_KEY_GEN: CK_MECHANISM_TYPE = 0x0000_1080;
pub const CKM_AES_ECB: CK_MECHANISM_TYPE = 0x0000_1081;
pub const CKM_AES_CBC: CK_MECHANISM_TYPE = 0x0000_1082;
pub const CKM_AES_MAC: CK_MECHANISM_TYPE = 0x0000_1083;
pub const CKM_AES_CBC_PAD: CK_MECHANISM_TYPE = 0x0000_1085;
pub const CKM_AES_CTR: CK_MECHANISM_TYPE = 0x0000_1086;
pub const CKM_AES_GCM: CK_MECHANISM_TYPE = 0x0000_1087;
pub const CKM_AES_CCM: CK_MECHANISM_TYPE = 0x0000_1088;
pub const CKM_AES_ECB_ENCRYPT_DATA: CK_MECHANISM_TYPE = 0x0000_1104;
pub const CKM_AES_CBC_ENCRYPT_DATA: CK_MECHANISM_TYPE = 0x0000_1105;
pub const CKM_AES_KEY_WRAP: CK_MECHANISM_TYPE = 0x0000_2109;
pub const CKM_AES_KEY_WRAP_PAD: CK_MECHANISM_TYPE = 0x0000_210A;
pub const CKM_VENDOR_DEFINED: CK_MECHANISM_TYPE = 0x8000_0000;

/* Mask generation functions */
pub const CKG_MGF1_SHA1: CK_RSA_PKCS_MGF_TYPE = 0x0000_0001;
pub const CKG_MGF1_SHA256: CK_RSA_PKCS_MGF_TYPE = 0x0000_0002;
pub const CKG_MGF1_SHA384: CK_RSA_PKCS_MGF_TYPE = 0x0000_0003;
pub const CKG_MGF1_SHA512: CK_RSA_PKCS_MGF_TYPE = 0x0000_0004;
pub const CKG_MGF1_SHA224: CK_RSA_PKCS_MGF_TYPE = 0x0000_0005;

/* OAEP encoding parameter sources */
pub const CKZ_DATA_SPECIFIED: CK_RSA_PKCS_OAEP_SOURCE_TYPE = 0x0000_0001;

/* EC key derivation functions */
pub const CKD_NULL: CK_EC_KDF_TYPE = 0x0000_0001;
pub const CKD_SHA1_KDF: CK_EC_KDF_TYPE = 0x0000_0002;
pub const CKD_SHA224_KDF: CK_EC_KDF_TYPE = 0x0000_0005;
pub const CKD_SHA256_KDF: CK_EC_KDF_TYPE = 0x0000_0006;
pub const CKD_SHA384_KDF: CK_EC_KDF_TYPE = 0x0000_0007;
pub const CKD_SHA512_KDF: CK_EC_KDF_TYPE = 0x0000_0008;

/* Return values */
pub const CKR_OK: CK_RV = 0x0000_0000;
pub const CKR_CANCEL: CK_RV = 0x0000_0001;
pub const CKR_HOST_MEMORY: CK_RV = 0x0000_0002;
pub const CKR_SLOT_ID_INVALID: CK_RV = 0x0000_0003;
pub const CKR_GENERAL_ERROR: CK_RV = 0x0000_0005;
pub const CKR_FUNCTION_FAILED: CK_RV = 0x0000_0006;
pub const CKR_ARGUMENTS_BAD: CK_RV = 0x0000_0007;
pub const CKR_ATTRIBUTE_READ_ONLY: CK_RV = 0x0000_0010;
pub const CKR_ATTRIBUTE_SENSITIVE: CK_RV = 0x0000_0011;
pub const CKR_ATTRIBUTE_TYPE_INVALID: CK_RV = 0x0000_0012;
pub const CKR_ATTRIBUTE_VALUE_INVALID: CK_RV = 0x0000_0013;
pub const CKR_ACTION_PROHIBITED: CK_RV = 0x0000_001B;
pub const CKR_DATA_INVALID: CK_RV = 0x0000_0020;
pub const CKR_DATA_LEN_RANGE: CK_RV = 0x0000_0021;
pub const CKR_DEVICE_ERROR: CK_RV = 0x0000_0030;
pub const CKR_DEVICE_MEMORY: CK_RV = 0x0000_0031;
pub const CKR_DEVICE_REMOVED: CK_RV = 0x0000_0032;
pub const CKR_ENCRYPTED_DATA_INVALID: CK_RV = 0x0000_0040;
pub const CKR_ENCRYPTED_DATA_LEN_RANGE: CK_RV = 0x0000_0041;
pub const CKR_FUNCTION_NOT_SUPPORTED: CK_RV = 0x0000_0054;
pub const CKR_KEY_HANDLE_INVALID: CK_RV = 0x0000_0060;
pub const CKR_KEY_SIZE_RANGE: CK_RV = 0x0000_0062;
pub const CKR_KEY_TYPE_INCONSISTENT: CK_RV = 0x0000_0063;
pub const CKR_KEY_FUNCTION_NOT_PERMITTED: CK_RV = 0x0000_0068;
pub const CKR_KEY_UNEXTRACTABLE: CK_RV = 0x0000_006A;
pub const CKR_MECHANISM_INVALID: CK_RV = 0x0000_0070;
pub const CKR_MECHANISM_PARAM_INVALID: CK_RV = 0x0000_0071;
pub const CKR_OBJECT_HANDLE_INVALID: CK_RV = 0x0000_0082;
pub const CKR_OPERATION_ACTIVE: CK_RV = 0x0000_0090;
pub const CKR_OPERATION_NOT_INITIALIZED: CK_RV = 0x0000_0091;
pub const CKR_PIN_INCORRECT: CK_RV = 0x0000_00A0;
pub const CKR_SESSION_CLOSED: CK_RV = 0x0000_00B0;
pub const CKR_SESSION_HANDLE_INVALID: CK_RV = 0x0000_00B3;
pub const CKR_SESSION_READ_ONLY: CK_RV = 0x0000_00B5;
pub const CKR_SIGNATURE_INVALID: CK_RV = 0x0000_00C0;
pub const CKR_SIGNATURE_LEN_RANGE: CK_RV = 0x0000_00C1;
pub const CKR_TEMPLATE_INCOMPLETE: CK_RV = 0x0000_00D0;
pub const CKR_TEMPLATE_INCONSISTENT: CK_RV = 0x0000_00D1;
pub const CKR_UNWRAPPING_KEY_HANDLE_INVALID: CK_RV = 0x0000_00F0;
pub const CKR_USER_NOT_LOGGED_IN: CK_RV = 0x0000_0101;
pub const CKR_WRAPPED_KEY_INVALID: CK_RV = 0x0000_0110;
pub const CKR_WRAPPING_KEY_HANDLE_INVALID: CK_RV = 0x0000_0113;
pub const CKR_BUFFER_TOO_SMALL: CK_RV = 0x0000_0150;
pub const CKR_CRYPTOKI_NOT_INITIALIZED: CK_RV = 0x0000_0190;
pub const CKR_VENDOR_DEFINED: CK_RV = 0x8000_0000;

/// Returns the symbolic name of a return value, if it is one we know
pub fn rv_name(rv: CK_RV) -> Option<&'static str> {
    let name = match rv {
        CKR_OK => "CKR_OK",
        CKR_CANCEL => "CKR_CANCEL",
        CKR_HOST_MEMORY => "CKR_HOST_MEMORY",
        CKR_SLOT_ID_INVALID => "CKR_SLOT_ID_INVALID",
        CKR_GENERAL_ERROR => "CKR_GENERAL_ERROR",
        CKR_FUNCTION_FAILED => "CKR_FUNCTION_FAILED",
        CKR_ARGUMENTS_BAD => "CKR_ARGUMENTS_BAD",
        CKR_ATTRIBUTE_READ_ONLY => "CKR_ATTRIBUTE_READ_ONLY",
        CKR_ATTRIBUTE_SENSITIVE => "CKR_ATTRIBUTE_SENSITIVE",
        CKR_ATTRIBUTE_TYPE_INVALID => "CKR_ATTRIBUTE_TYPE_INVALID",
        CKR_ATTRIBUTE_VALUE_INVALID => "CKR_ATTRIBUTE_VALUE_INVALID",
        CKR_ACTION_PROHIBITED => "CKR_ACTION_PROHIBITED",
        CKR_DATA_INVALID => "CKR_DATA_INVALID",
        CKR_DATA_LEN_RANGE => "CKR_DATA_LEN_RANGE",
        CKR_DEVICE_ERROR => "CKR_DEVICE_ERROR",
        CKR_DEVICE_MEMORY => "CKR_DEVICE_MEMORY",
        CKR_DEVICE_REMOVED => "CKR_DEVICE_REMOVED",
        CKR_ENCRYPTED_DATA_INVALID => "CKR_ENCRYPTED_DATA_INVALID",
        CKR_ENCRYPTED_DATA_LEN_RANGE => "CKR_ENCRYPTED_DATA_LEN_RANGE",
        CKR_FUNCTION_NOT_SUPPORTED => "CKR_FUNCTION_NOT_SUPPORTED",
        CKR_KEY_HANDLE_INVALID => "CKR_KEY_HANDLE_INVALID",
        CKR_KEY_SIZE_RANGE => "CKR_KEY_SIZE_RANGE",
        CKR_KEY_TYPE_INCONSISTENT => "CKR_KEY_TYPE_INCONSISTENT",
        CKR_KEY_FUNCTION_NOT_PERMITTED => "CKR_KEY_FUNCTION_NOT_PERMITTED",
        CKR_KEY_UNEXTRACTABLE => "CKR_KEY_UNEXTRACTABLE",
        CKR_MECHANISM_INVALID => "CKR_MECHANISM_INVALID",
        CKR_MECHANISM_PARAM_INVALID => "CKR_MECHANISM_PARAM_INVALID",
        CKR_OBJECT_HANDLE_INVALID => "CKR_OBJECT_HANDLE_INVALID",
        CKR_OPERATION_ACTIVE => "CKR_OPERATION_ACTIVE",
        CKR_OPERATION_NOT_INITIALIZED => "CKR_OPERATION_NOT_INITIALIZED",
        CKR_PIN_INCORRECT => "CKR_PIN_INCORRECT",
        CKR_SESSION_CLOSED => "CKR_SESSION_CLOSED",
        CKR_SESSION_HANDLE_INVALID => "CKR_SESSION_HANDLE_INVALID",
        CKR_SESSION_READ_ONLY => "CKR_SESSION_READ_ONLY",
        CKR_SIGNATURE_INVALID => "CKR_SIGNATURE_INVALID",
        CKR_SIGNATURE_LEN_RANGE => "CKR_SIGNATURE_LEN_RANGE",
        CKR_TEMPLATE_INCOMPLETE => "CKR_TEMPLATE_INCOMPLETE",
        CKR_TEMPLATE_INCONSISTENT => "CKR_TEMPLATE_INCONSISTENT",
        CKR_UNWRAPPING_KEY_HANDLE_INVALID => {
            "CKR_UNWRAPPING_KEY_HANDLE_INVALID"
        }
        CKR_USER_NOT_LOGGED_IN => "CKR_USER_NOT_LOGGED_IN",
        CKR_WRAPPED_KEY_INVALID => "CKR_WRAPPED_KEY_INVALID",
        CKR_WRAPPING_KEY_HANDLE_INVALID => "CKR_WRAPPING_KEY_HANDLE_INVALID",
        CKR_BUFFER_TOO_SMALL => "CKR_BUFFER_TOO_SMALL",
        CKR_CRYPTOKI_NOT_INITIALIZED => "CKR_CRYPTOKI_NOT_INITIALIZED",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulong_is_native_long() {
        assert_eq!(
            std::mem::size_of::<CK_ULONG>(),
            std::mem::size_of::<std::os::raw::c_ulong>()
        );
    }

    #[test]
    fn names() {
        assert_eq!(rv_name(CKR_SIGNATURE_INVALID), Some("CKR_SIGNATURE_INVALID"));
        assert_eq!(rv_name(CKR_VENDOR_DEFINED + 1), None);
    }
}
