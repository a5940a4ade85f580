//! LES request signatures.
//!
//! High entropy (> [`HIGH_ENTROPY_THRESHOLD`]) keeps a raw prefix; otherwise
//! the signature is built from the keywords present in the text.

/// Entropy strictly above this value selects the prefix form.
pub const HIGH_ENTROPY_THRESHOLD: f64 = 0.7;

/// Keywords checked for the low-entropy form, in order.
pub const KEYWORDS: [&str; 3] = ["qubit", "spin", "fc-496"];

/// Maximum character length of a keyword signature.
pub const MAX_KEYWORD_SIGNATURE_CHARS: usize = 20;

/// Characters of the input text kept by the prefix forms.
pub const PREFIX_CHARS: usize = 5;

const COMPRESSED_TAG: &str = "COMP_";
const UNKNOWN_TAG: &str = "UNK_";

/// Derive the signature of `text` at the given entropy.
///
/// - `entropy > 0.7`: `COMP_` + first 5 characters.
/// - otherwise, matched keywords joined by `_`, cut to 20 characters.
/// - no keyword: `UNK_` + first 5 characters.
#[must_use]
pub fn compress(text: &str, entropy: f64) -> String {
    if entropy > HIGH_ENTROPY_THRESHOLD {
        return tagged_prefix(COMPRESSED_TAG, text);
    }

    let lower = text.to_lowercase();
    let found: Vec<&str> = KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lower.contains(keyword))
        .collect();

    if found.is_empty() {
        tagged_prefix(UNKNOWN_TAG, text)
    } else {
        found
            .join("_")
            .chars()
            .take(MAX_KEYWORD_SIGNATURE_CHARS)
            .collect()
    }
}

fn tagged_prefix(tag: &str, text: &str) -> String {
    let mut out = String::with_capacity(tag.len() + PREFIX_CHARS * 4);
    out.push_str(tag);
    out.extend(text.chars().take(PREFIX_CHARS));
    out
}
