//! Lowercase hex encoding for fixed-size byte identifiers.

/// Encode bytes as a lowercase hex string.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string into exactly `N` bytes.
///
/// Accepts upper- or lowercase digits and surrounding whitespace.
pub fn decode_array<const N: usize>(input: &str) -> Result<[u8; N], String> {
    let hex = input.trim();
    if hex.len() != N * 2 {
        return Err(format!("expected {} hex chars, got {}", N * 2, hex.len()));
    }
    let mut out = [0u8; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let pair = hex
            .get(i * 2..i * 2 + 2)
            .ok_or_else(|| format!("non-ascii input at position {}", i * 2))?;
        *slot = u8::from_str_radix(pair, 16)
            .map_err(|e| format!("invalid hex at position {}: {e}", i * 2))?;
    }
    Ok(out)
}

/// First four bytes as hex, for `Debug` output.
pub fn prefix(bytes: &[u8]) -> String {
    encode(&bytes[..bytes.len().min(4)])
}
