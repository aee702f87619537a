use sha3::{Digest, Keccak256};

use crate::error::AddressError;

/// Normalize an Ethereum address to lowercase without the 0x prefix.
/// This is the form used for watch-list matching; comparison is
/// case-insensitive so checksummed and lowercase inputs meet here.
pub fn normalize_address(address: &str) -> String {
    let addr = address.trim();
    if addr.starts_with("0x") || addr.starts_with("0X") {
        addr[2..].to_lowercase()
    } else {
        addr.to_lowercase()
    }
}

/// Validate that an input is a syntactically well-formed address:
/// exactly 40 hex characters after an optional 0x prefix.
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    let normalized = normalize_address(address);

    if normalized.len() != 40 {
        return Err(AddressError::Length(normalized.len()));
    }

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::NonHex(address.trim().to_string()));
    }

    Ok(())
}

/// Convert an address into its canonical EIP-55 checksummed form.
///
/// A hex letter is uppercased when the corresponding nibble of the
/// Keccak-256 hash of the lowercase hex body is >= 8.
pub fn to_checksum(address: &str) -> Result<String, AddressError> {
    validate_address(address)?;
    let lower = normalize_address(address);

    let mut hasher = Keccak256::new();
    hasher.update(lower.as_bytes());
    let hash = hasher.finalize();

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }

    Ok(out)
}
