//! Base64url codec (RFC 4648 §5) used by every JWT segment and JWK parameter
//!
//! Encoding never emits padding. Decoding accepts input with or without
//! trailing `=` padding, which is equivalent to restoring the padding and
//! decoding with the standard alphabet after swapping `-`/`_` for `+`/`/`.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::error::Result;

/// URL-safe alphabet, unpadded output, optional padding on input
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded base64url
pub fn encode(input: impl AsRef<[u8]>) -> String {
    ENGINE.encode(input)
}

/// Decode base64url text, padded or not
///
/// # Errors
///
/// Returns [`crate::TokenError::MalformedEncoding`] if the input contains
/// characters outside the URL-safe alphabet, has an impossible length, or
/// carries non-canonical trailing bits.
pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    Ok(ENGINE.decode(input)?)
}

/// Whether `c` may appear in a compact JWT segment
pub(crate) fn is_segment_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'=')
}
