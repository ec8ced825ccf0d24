/// Recipe naming policy: one or more characters, each alphabetic or a space.
///
/// Operates on the raw string. Case does not matter here; callers lower-case
/// names before storing them.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphabetic() || c == ' ')
}
