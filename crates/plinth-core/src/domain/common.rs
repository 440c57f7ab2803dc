/// Insert `substr` into `s` at byte `index`.
///
/// `index` is clamped to the string length and moved back to the nearest
/// char boundary, so the call never panics.
pub fn insert(substr: &str, s: &str, index: usize) -> String {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }

    let mut out = String::with_capacity(s.len() + substr.len());
    out.push_str(&s[..index]);
    out.push_str(substr);
    out.push_str(&s[index..]);
    out
}
