use std::cmp::Ordering;

pub fn parse_triple(raw: &str) -> Option<(u64, u64, u64)> {
    let mut parts = raw.split('.');
    let major = parse_component(parts.next()?)?;
    let minor = parse_component(parts.next()?)?;
    let patch = parse_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

pub fn is_triple(raw: &str) -> bool {
    parse_triple(raw).is_some()
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u64>().ok()
}

// First x.y.z substring anywhere in the text, for loose probe output
// like "Orbit version 1.4.2 (stable)". Leftmost match: every digit
// position is a fresh candidate, so "1..2.3.4" still yields "2.3.4".
pub fn find_triple(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    for start in 0..bytes.len() {
        if !bytes[start].is_ascii_digit() {
            continue;
        }
        if let Some(found) = match_triple_at(bytes, start) {
            return Some(found);
        }
    }
    None
}

fn match_triple_at(bytes: &[u8], start: usize) -> Option<String> {
    let mut pos = start;
    for component in 0..3 {
        let run_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == run_start {
            return None;
        }
        if component < 2 {
            if pos >= bytes.len() || bytes[pos] != b'.' {
                return None;
            }
            pos += 1;
        }
    }
    std::str::from_utf8(&bytes[start..pos])
        .ok()
        .map(str::to_string)
}

// Leading x.y.z prefix of a value ("2.0.0-beta" -> "2.0.0"), used by
// file-based probes, which are deliberately looser than executable probes.
pub fn triple_prefix(value: &str) -> Option<String> {
    let mut end = 0;
    let mut dots = 0;
    for (index, byte) in value.bytes().enumerate() {
        match byte {
            b'0'..=b'9' => end = index + 1,
            b'.' if dots < 2 => {
                dots += 1;
                end = index + 1;
            }
            _ => break,
        }
    }
    let candidate = value[..end].trim_end_matches('.');
    if is_triple(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

pub fn compare(a: &str, b: &str) -> Ordering {
    let left = components(a);
    let right = components(b);
    let len = left.len().max(right.len());
    for index in 0..len {
        let lhs = left.get(index).copied().unwrap_or(0);
        let rhs = right.get(index).copied().unwrap_or(0);
        match lhs.cmp(&rhs) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

fn components(raw: &str) -> Vec<u64> {
    raw.trim()
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

// Empty installed means fresh install; empty remote is never a reason
// to reinstall.
pub fn is_update_needed(installed: &str, remote: &str) -> bool {
    if installed.is_empty() {
        return true;
    }
    if remote.is_empty() {
        return false;
    }
    compare(installed, remote) == Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_parsing_is_anchored() {
        assert_eq!(parse_triple("1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_triple("0.1.15"), Some((0, 1, 15)));
        assert_eq!(parse_triple("1.2"), None);
        assert_eq!(parse_triple("1.2.3.4"), None);
        assert_eq!(parse_triple("1.2.3-beta"), None);
        assert_eq!(parse_triple("v1.2.3"), None);
        assert_eq!(parse_triple(""), None);
    }

    #[test]
    fn comparison_is_numeric_not_lexicographic() {
        assert_eq!(compare("1.2.3", "1.2.10"), Ordering::Less);
        assert_eq!(compare("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("2.0.0", "1.99.99"), Ordering::Greater);
    }

    #[test]
    fn shorter_sequences_pad_with_zero() {
        assert_eq!(compare("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn empty_installed_means_update_needed() {
        assert!(is_update_needed("", "1.0.0"));
    }

    #[test]
    fn empty_remote_never_triggers_update() {
        assert!(!is_update_needed("1.0.0", ""));
    }

    #[test]
    fn equal_and_ahead_need_no_update() {
        assert!(!is_update_needed("1.2.0", "1.2.0"));
        assert!(!is_update_needed("1.3.0", "1.2.0"));
        assert!(is_update_needed("1.2.0", "1.2.1"));
    }

    #[test]
    fn finds_first_triple_in_loose_output() {
        assert_eq!(
            find_triple("Orbit version 1.4.2 (build 778)").as_deref(),
            Some("1.4.2")
        );
        assert_eq!(find_triple("no version here"), None);
        assert_eq!(find_triple("x 12 then 3.4.5 later").as_deref(), Some("3.4.5"));
    }

    #[test]
    fn failed_candidate_does_not_mask_a_later_triple() {
        assert_eq!(find_triple("build 1..2.3.4").as_deref(), Some("2.3.4"));
        assert_eq!(find_triple("1.2.3.4").as_deref(), Some("1.2.3"));
        assert_eq!(find_triple("12a3.4.5").as_deref(), Some("3.4.5"));
    }

    #[test]
    fn prefix_rule_accepts_prerelease_suffixes() {
        assert_eq!(triple_prefix("2.0.0-beta").as_deref(), Some("2.0.0"));
        assert_eq!(triple_prefix("0.1.15").as_deref(), Some("0.1.15"));
        assert_eq!(triple_prefix("beta-2.0.0"), None);
        assert_eq!(triple_prefix("2.0"), None);
    }
}
