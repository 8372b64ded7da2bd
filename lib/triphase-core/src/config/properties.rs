use std::collections::BTreeMap;

use super::ConfigError;

const SEPARATORS: [char; 3] = [' ', '\t', '\x0c'];

/// Parses the `java.util.Properties` text format.
///
/// Later occurrences of a key override earlier ones.
pub(super) fn parse_properties(input: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut properties = BTreeMap::new();
    let mut lines = input.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line = line.trim_start_matches(SEPARATORS);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_owned();
        while has_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(SEPARATORS)),
                None => break,
            }
        }

        let (raw_key, raw_value) = split_entry(&logical);
        let syntax_error = |reason| ConfigError::Syntax {
            line: index + 1,
            reason,
        };
        let key = unescape(raw_key).map_err(syntax_error)?;
        let value = unescape(raw_value).map_err(syntax_error)?;

        properties.insert(key, value);
    }

    Ok(properties)
}

/// An odd number of trailing backslashes joins the next line
fn has_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (position, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = position;
                break;
            }
            c if SEPARATORS.contains(&c) => {
                key_end = position;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches(SEPARATORS);
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);

    (key, rest.trim_start_matches(SEPARATORS))
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut result = String::with_capacity(raw.len());
    let mut high_surrogate: Option<u32> = None;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            if high_surrogate.take().is_some() {
                return Err("unpaired UTF-16 surrogate".to_owned());
            }
            result.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            break;
        };

        if escaped == 'u' {
            let code: String = chars.by_ref().take(4).collect();
            let unit = u32::from_str_radix(&code, 16)
                .ok()
                .filter(|_| code.len() == 4)
                .ok_or_else(|| format!("malformed \\uxxxx encoding `{code}`"))?;

            let decoded = match (high_surrogate.take(), unit) {
                (None, 0xD800..=0xDBFF) => {
                    high_surrogate = Some(unit);
                    continue;
                }
                (Some(high), 0xDC00..=0xDFFF) => {
                    0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00)
                }
                (None, unit) => unit,
                (Some(_), _) => return Err("unpaired UTF-16 surrogate".to_owned()),
            };

            result.push(
                char::from_u32(decoded).ok_or_else(|| format!("invalid code point `{code}`"))?,
            );
            continue;
        }

        if high_surrogate.take().is_some() {
            return Err("unpaired UTF-16 surrogate".to_owned());
        }

        result.push(match escaped {
            't' => '\t',
            'n' => '\n',
            'r' => '\r',
            'f' => '\x0c',
            other => other,
        });
    }

    if high_surrogate.is_some() {
        return Err("unpaired UTF-16 surrogate".to_owned());
    }

    Ok(result)
}
