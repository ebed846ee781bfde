//! ## pattern
//!
//! SMB wildcard matching for transports without server side filtering

/// Match `name` against an SMB search pattern, where `*` matches any run of characters
/// and `?` matches exactly one. Matching is case insensitive, as on Windows servers.
pub fn matches(pattern: &str, name: &str) -> bool {
    if pattern == "*" || pattern == "*.*" {
        return true;
    }
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();
    let (mut p, mut n) = (0, 0);
    // position of the last `*` and the name index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(c) if *c == '?' || *c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, from)) => {
                    p = star + 1;
                    n = from + 1;
                    backtrack = Some((star, from + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn should_match_everything() {
        assert!(matches("*", "a.txt"));
        assert!(matches("*", ""));
        assert!(matches("*.*", "noext"));
    }

    #[test]
    fn should_match_wildcards() {
        assert!(matches("*.txt", "probe.TXT"));
        assert!(matches("AWS*_?.txt", "AWSLambdaRequestId_1.txt"));
        assert!(matches("a*b*c", "axxbyyc"));
        assert!(!matches("*.txt", "probe.log"));
        assert!(!matches("a?c", "abbc"));
        assert!(matches("report.csv", "REPORT.csv"));
    }
}
