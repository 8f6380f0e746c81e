//! Interpretation of text decoded from a QR code. The camera and the QR
//! decoding itself live outside this crate; only the decoded string comes in.

/// What a decoded QR string turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScannedCode {
    /// A UPI payment deep link, meant to be handed to a payment app.
    UpiLink(String),
    /// Anything else: opaque text the user may copy.
    Text(String),
}

/// Classify a decoded string. Blank input yields `None`.
pub(crate) fn classify(decoded: &str) -> Option<ScannedCode> {
    let text = decoded.trim();
    if text.is_empty() {
        return None;
    }
    if text.starts_with("upi://") {
        Some(ScannedCode::UpiLink(text.to_string()))
    } else {
        Some(ScannedCode::Text(text.to_string()))
    }
}
