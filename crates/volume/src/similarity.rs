//! Partial-substring similarity, scored 0–100.
//!
//! `ratio` is the normalized Indel similarity `200 * LCS / (|a| + |b|)`.
//! `partial_ratio` slides the shorter string over the longer one and keeps the
//! best `ratio` across all full-length windows plus the partial windows that
//! hang off either end. A shorter string contained in the longer scores 100.
//!
//! Scoring is case-insensitive: both sides are lower-cased before comparison.
//! Exact catalog lookups stay case-sensitive; only the fuzzy fallback folds case.

/// Longest pattern handled by the bit-parallel LCS kernel.
const BIT_PARALLEL_MAX: usize = 64;

/// A case-folded string with its LCS bitmasks precomputed.
#[derive(Debug, Clone)]
pub struct Prepared {
    chars: Vec<char>,
    masks: Option<PatternMasks>,
}

#[derive(Debug, Clone)]
struct PatternMasks {
    ascii: [u64; 128],
    other: Vec<(char, u64)>,
}

impl PatternMasks {
    fn new(chars: &[char]) -> Self {
        let mut masks = Self {
            ascii: [0; 128],
            other: Vec::new(),
        };
        for (i, &c) in chars.iter().enumerate() {
            let bit = 1u64 << i;
            if (c as u32) < 128 {
                masks.ascii[c as usize] |= bit;
            } else if let Some(entry) = masks.other.iter_mut().find(|(oc, _)| *oc == c) {
                entry.1 |= bit;
            } else {
                masks.other.push((c, bit));
            }
        }
        masks
    }

    fn get(&self, c: char) -> u64 {
        if (c as u32) < 128 {
            self.ascii[c as usize]
        } else {
            self.other
                .iter()
                .find(|(oc, _)| *oc == c)
                .map(|(_, m)| *m)
                .unwrap_or(0)
        }
    }
}

impl Prepared {
    pub fn new(s: &str) -> Self {
        let chars: Vec<char> = s.chars().flat_map(char::to_lowercase).collect();
        let masks = (!chars.is_empty() && chars.len() <= BIT_PARALLEL_MAX)
            .then(|| PatternMasks::new(&chars));
        Self { chars, masks }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// LCS length between this pattern and `text`.
    fn lcs(&self, text: &[char]) -> usize {
        match &self.masks {
            Some(masks) => lcs_bit_parallel(masks, self.chars.len(), text),
            None => lcs_dp(&self.chars, text),
        }
    }
}

/// Hyyrö's bit-vector LCS; `m` must be at most 64.
fn lcs_bit_parallel(masks: &PatternMasks, m: usize, text: &[char]) -> usize {
    let mut v = u64::MAX;
    for &c in text {
        let u = v & masks.get(c);
        v = v.wrapping_add(u) | v.wrapping_sub(u);
    }
    let low = if m == 64 { u64::MAX } else { (1u64 << m) - 1 };
    (!v & low).count_ones() as usize
}

fn lcs_dp(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &x in a {
        for (j, &y) in b.iter().enumerate() {
            cur[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn indel_ratio(lcs: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        0.0
    } else {
        200.0 * lcs as f64 / total_len as f64
    }
}

/// Normalized Indel similarity of two strings (case-insensitive).
pub fn ratio(a: &str, b: &str) -> f64 {
    let a = Prepared::new(a);
    let b = Prepared::new(b);
    indel_ratio(a.lcs(&b.chars), a.len() + b.len())
}

/// Partial-substring similarity of two strings (case-insensitive, symmetric).
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    partial_ratio_prepared(&Prepared::new(a), &Prepared::new(b))
}

/// [`partial_ratio`] over already-prepared strings.
pub fn partial_ratio_prepared(a: &Prepared, b: &Prepared) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (needle, haystack) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let score = best_window(needle, haystack);
    if a.len() == b.len() && score < 100.0 {
        score.max(best_window(haystack, needle))
    } else {
        score
    }
}

fn best_window(needle: &Prepared, haystack: &Prepared) -> f64 {
    let m = needle.len();
    let n = haystack.len();
    let hay = &haystack.chars;

    let prefixes = (1..m).map(|len| &hay[..len]);
    let full = (0..=n - m).map(|start| &hay[start..start + m]);
    let suffixes = (n - m + 1..n).map(|start| &hay[start..]);

    let mut best = 0.0_f64;
    for window in prefixes.chain(full).chain(suffixes) {
        let score = indel_ratio(needle.lcs(window), m + window.len());
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn containment_scores_100() {
        assert_eq!(partial_ratio("Widget", "Widget A"), 100.0);
        assert_eq!(partial_ratio("Blue Chair", "Blue Chairs Set"), 100.0);
        assert_eq!(partial_ratio("Widget A Large", "Widget A"), 100.0);
    }

    #[test]
    fn case_is_folded() {
        assert_eq!(partial_ratio("widget a", "Widget A"), 100.0);
        assert_eq!(ratio("ABC", "abc"), 100.0);
    }

    #[test]
    fn one_substitution_in_five_scores_80() {
        assert_eq!(partial_ratio("abcde", "abxde"), 80.0);
    }

    #[test]
    fn edge_windows_are_considered() {
        // The prefix "abcd" of the haystack beats the full window.
        assert!(approx(partial_ratio("abcde", "abcdx"), 88.889));
    }

    #[test]
    fn spread_substitutions_fall_just_below_80() {
        let score = partial_ratio("abcdefghijklmnopqrstuvwx", "ab#defg#ijkl#nop#rstu#wx");
        assert!(approx(score, 79.1667), "score was {score}");
        assert!(score < 80.0);
    }

    #[test]
    fn unrelated_names_score_low() {
        assert!(approx(partial_ratio("Unknown Thing", "Widget A"), 37.5));
        assert!(approx(partial_ratio("Gadget", "Widget A"), 66.667));
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(partial_ratio("", "Widget"), 0.0);
        assert_eq!(partial_ratio("Widget", ""), 0.0);
        assert_eq!(partial_ratio("", ""), 0.0);
        assert_eq!(ratio("", ""), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("Red Lamp", "Red Lamps"),
            ("abcdefghij", "abxdefgxij"),
            ("Widget C", "Widget A"),
            ("纸箱 大号", "纸箱 大号 加厚"),
        ];
        for (a, b) in pairs {
            assert_eq!(partial_ratio(a, b), partial_ratio(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn non_ascii_names() {
        assert_eq!(partial_ratio("纸箱 大号", "纸箱 大号 加厚"), 100.0);
        assert_eq!(partial_ratio("ÉTAGÈRE", "étagère murale"), 100.0);
    }

    #[test]
    fn long_needles_use_dp_path() {
        let long: String = "abcdefghij".repeat(7);
        let hay = format!("prefix {long} suffix");
        assert_eq!(partial_ratio(&long, &hay), 100.0);
    }

    #[test]
    fn bit_parallel_agrees_with_dp() {
        let cases = [
            ("kitten", "sitting"),
            ("abcdefghij", "abxdefgxij"),
            ("aaaa", "aa"),
            ("héllo wörld", "hello world"),
            ("", "abc"),
            ("abc", ""),
            ("the quick brown fox", "quick the fox brown"),
        ];
        for (a, b) in cases {
            let pa = Prepared::new(a);
            let pb = Prepared::new(b);
            assert_eq!(pa.lcs(&pb.chars), lcs_dp(&pa.chars, &pb.chars), "{a} / {b}");
        }
    }

    #[test]
    fn full_width_pattern() {
        let a: String = (0..64).map(|i| char::from(b'!' + i as u8)).collect();
        let pa = Prepared::new(&a);
        let pb = Prepared::new(&a);
        assert_eq!(pa.lcs(&pb.chars), 64);
        assert_eq!(partial_ratio(&a, &a), 100.0);
    }
}
