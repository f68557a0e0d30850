//! Path patterns for export filters and Multi container globs.

/// Matches an entry path against a glob-style pattern.
///
/// The pattern is tried against every `/`-separated component and against
/// the whole path, so `sound` selects everything below a `sound` directory
/// and `*.wav` selects by extension anywhere.
///
/// # Examples
///
/// ```
/// use gamepak_core::export::filters::matches_pattern;
///
/// assert!(matches_pattern("maps/e1m1.bsp", "*.bsp"));
/// assert!(matches_pattern("sound/misc/null.wav", "sound"));
/// assert!(matches_pattern("maps/e1m1.bsp", "maps/e1m*"));
/// assert!(!matches_pattern("progs/player.mdl", "*.bsp"));
/// ```
#[must_use]
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    path.split('/')
        .any(|component| pattern_matches(component, pattern))
        || pattern_matches(path, pattern)
}

/// Matches a string against a pattern where `*` is any run of characters
/// and `?` any single character.
#[must_use]
pub fn pattern_matches(s: &str, pattern: &str) -> bool {
    if pattern == s {
        return true;
    }
    if !pattern.contains(['*', '?']) {
        return false;
    }

    let text: Vec<char> = s.chars().collect();
    let pat: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    // Position of the last `*` and the text index it currently absorbs up to.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    pat[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_affix() {
        assert!(pattern_matches("pak0.pak", "pak0.pak"));
        assert!(pattern_matches("pak0.pak", "pak*"));
        assert!(pattern_matches("pak0.pak", "*.pak"));
        assert!(!pattern_matches("pak0.pk3", "*.pak"));
        assert!(!pattern_matches("mypak", "pak*"));
    }

    #[test]
    fn test_inner_star_and_question() {
        assert!(pattern_matches("pak12.pak", "pak*.pak"));
        assert!(pattern_matches("pak.pak", "pak*.pak"));
        assert!(!pattern_matches("pak1.zip", "pak*.pak"));
        assert!(pattern_matches("pak1.pak", "pak?.pak"));
        assert!(!pattern_matches("pak12.pak", "pak?.pak"));
        assert!(pattern_matches("a.b.c", "*.*.*"));
        assert!(pattern_matches("", "*"));
        assert!(!pattern_matches("", "?"));
    }

    #[test]
    fn test_component_match() {
        assert!(matches_pattern("id1/maps/start.bsp", "maps"));
        assert!(matches_pattern("id1/maps/start.bsp", "id1/*"));
        assert!(!matches_pattern("id1/maps/start.bsp", "map"));
    }
}
