const PREFIX: &str = "${";
const SUFFIX: char = '}';

/// Replaces every `${name}` with `lookup(name)`.
///
/// Unknown names are kept verbatim. Substituted values are not scanned again and an
/// unterminated `${` leaves the rest of the value untouched.
pub(super) fn resolve_placeholders(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut resolved = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find(PREFIX) {
        let after_prefix = &rest[start + PREFIX.len()..];
        let Some(end) = after_prefix.find(SUFFIX) else {
            break;
        };

        let name = &after_prefix[..end];
        resolved.push_str(&rest[..start]);
        match lookup(name) {
            Some(substitute) => resolved.push_str(&substitute),
            None => resolved.push_str(&rest[start..start + PREFIX.len() + end + 1]),
        }

        rest = &after_prefix[end + 1..];
    }

    resolved.push_str(rest);
    resolved
}
