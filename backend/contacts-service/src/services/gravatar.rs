/// Deterministic identicon URLs derived from the account email.
///
/// The email is trimmed and lowercased before hashing, so the URL is
/// stable across case and whitespace variations of the same address.
pub fn identicon_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = md5::compute(normalized.as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{:x}?d=identicon&s=250",
        digest
    )
}
