//! Sequence diff over arbitrary comparable items.
//!
//! This module implements Myers' O(ND) difference algorithm in its
//! linear-space, divide-and-conquer form. It produces the same opcode model
//! as Python's `difflib.SequenceMatcher.get_opcodes`, but the edit script is
//! minimal: every item outside the reported `Equal` runs belongs to a
//! shortest edit script between the two sequences.

/// Opcode tag indicating the type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeTag {
    Replace,
    Delete,
    Insert,
    Equal,
}

/// An opcode representing a single edit operation.
/// Format: (tag, i1, i2, j1, j2) where:
/// - i1:i2 is the range in sequence a
/// - j1:j2 is the range in sequence b
pub type Opcode = (OpcodeTag, usize, usize, usize, usize);

/// The diff was abandoned because the caller asked it to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// A matching block: (i, j, n) means a[i:i+n] == b[j:j+n]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    i: usize,
    j: usize,
    n: usize,
}

/// Furthest-reaching x coordinate per diagonal `k`, indexed from `-offset`.
struct V {
    offset: isize,
    v: Vec<usize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            v: vec![0; 2 * max_d + 2],
        }
    }

    fn get(&self, k: isize) -> usize {
        self.v[(k + self.offset) as usize]
    }

    fn set(&mut self, k: isize, x: usize) {
        self.v[(k + self.offset) as usize] = x;
    }
}

fn max_d(len_a: usize, len_b: usize) -> usize {
    (len_a + len_b + 1) / 2 + 1
}

struct Myers<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Polled once per edit distance step of every middle-snake search.
    interrupt: &'a dyn Fn() -> bool,
    vf: V,
    vb: V,
    matches: Vec<Match>,
}

impl<'a, T: PartialEq> Myers<'a, T> {
    fn new(a: &'a [T], b: &'a [T], interrupt: &'a dyn Fn() -> bool) -> Self {
        let d = max_d(a.len(), b.len());
        Self {
            a,
            b,
            interrupt,
            vf: V::new(d),
            vb: V::new(d),
            matches: Vec::new(),
        }
    }

    fn common_prefix_len(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> usize {
        self.a[alo..ahi]
            .iter()
            .zip(&self.b[blo..bhi])
            .take_while(|(x, y)| x == y)
            .count()
    }

    fn common_suffix_len(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> usize {
        self.a[alo..ahi]
            .iter()
            .rev()
            .zip(self.b[blo..bhi].iter().rev())
            .take_while(|(x, y)| x == y)
            .count()
    }

    /// Find the start of the middle snake of a[alo:ahi] and b[blo:bhi].
    ///
    /// Both ranges must be non-empty and must not share a common prefix or
    /// suffix, so the edit distance is at least 2 and each half of the split
    /// is strictly smaller than the whole.
    fn find_middle_snake(
        &mut self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> Result<Option<(usize, usize)>, Interrupted> {
        let n = ahi - alo;
        let m = bhi - blo;
        let delta = n as isize - m as isize;
        let odd = delta & 1 == 1;

        self.vf.set(1, 0);
        self.vb.set(1, 0);

        for d in 0..max_d(n, m) as isize {
            if (self.interrupt)() {
                return Err(Interrupted);
            }

            // Forward pass
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.vf.get(k - 1) < self.vf.get(k + 1)) {
                    self.vf.get(k + 1)
                } else {
                    self.vf.get(k - 1) + 1
                };
                let y = (x as isize - k) as usize;
                let (x0, y0) = (x, y);
                if x < n && y < m {
                    x += self.common_prefix_len(alo + x, ahi, blo + y, bhi);
                }
                self.vf.set(k, x);

                if odd && (k - delta).abs() <= d - 1 && x + self.vb.get(-(k - delta)) >= n {
                    return Ok(Some((alo + x0, blo + y0)));
                }
            }

            // Backward pass
            for k in (-d..=d).rev().step_by(2) {
                let mut x = if k == -d || (k != d && self.vb.get(k - 1) < self.vb.get(k + 1)) {
                    self.vb.get(k + 1)
                } else {
                    self.vb.get(k - 1) + 1
                };
                let mut y = (x as isize - k) as usize;
                if x < n && y < m {
                    let advance = self.common_suffix_len(alo, ahi - x, blo, bhi - y);
                    x += advance;
                    y += advance;
                }
                self.vb.set(k, x);

                if !odd && (k - delta).abs() <= d && x + self.vf.get(-(k - delta)) >= n {
                    return Ok(Some((ahi - x, bhi - y)));
                }
            }
        }

        Ok(None)
    }

    /// Record the matching blocks of a[alo:ahi] and b[blo:bhi].
    fn conquer(
        &mut self,
        mut alo: usize,
        mut ahi: usize,
        mut blo: usize,
        mut bhi: usize,
    ) -> Result<(), Interrupted> {
        let prefix = self.common_prefix_len(alo, ahi, blo, bhi);
        if prefix > 0 {
            self.matches.push(Match { i: alo, j: blo, n: prefix });
            alo += prefix;
            blo += prefix;
        }

        let suffix = self.common_suffix_len(alo, ahi, blo, bhi);
        if suffix > 0 {
            ahi -= suffix;
            bhi -= suffix;
            self.matches.push(Match { i: ahi, j: bhi, n: suffix });
        }

        if alo == ahi || blo == bhi {
            return Ok(());
        }

        // No snake means nothing matches in this box; the region is a
        // plain replace and contributes no matching block.
        if let Some((x, y)) = self.find_middle_snake(alo, ahi, blo, bhi)? {
            self.conquer(alo, x, blo, y)?;
            self.conquer(x, ahi, y, bhi)?;
        }
        Ok(())
    }

    /// Return list of matching blocks, sorted and collapsed, with a sentinel.
    fn get_matching_blocks(mut self) -> Result<Vec<Match>, Interrupted> {
        let la = self.a.len();
        let lb = self.b.len();

        self.conquer(0, la, 0, lb)?;

        let mut matching_blocks = self.matches;
        matching_blocks.sort_by(|a, b| a.i.cmp(&b.i).then_with(|| a.j.cmp(&b.j)));

        // Collapse adjacent equal blocks
        let mut i1 = 0;
        let mut j1 = 0;
        let mut k1 = 0;
        let mut result = Vec::new();

        for m in matching_blocks {
            if i1 + k1 == m.i && j1 + k1 == m.j {
                k1 += m.n;
            } else {
                if k1 > 0 {
                    result.push(Match { i: i1, j: j1, n: k1 });
                }
                i1 = m.i;
                j1 = m.j;
                k1 = m.n;
            }
        }
        if k1 > 0 {
            result.push(Match { i: i1, j: j1, n: k1 });
        }

        // Append sentinel
        result.push(Match { i: la, j: lb, n: 0 });

        Ok(result)
    }
}

/// Return list of opcodes describing how to turn `a` into `b`.
///
/// Opcodes are contiguous and cover both sequences in order. `interrupt` is
/// polled throughout; once it returns `true` the diff stops with
/// [`Interrupted`].
pub fn opcodes<T: PartialEq>(
    a: &[T],
    b: &[T],
    interrupt: &dyn Fn() -> bool,
) -> Result<Vec<Opcode>, Interrupted> {
    let mut opcodes = Vec::new();
    let mut i = 0;
    let mut j = 0;

    for m in Myers::new(a, b, interrupt).get_matching_blocks()? {
        let tag = if i < m.i && j < m.j {
            Some(OpcodeTag::Replace)
        } else if i < m.i {
            Some(OpcodeTag::Delete)
        } else if j < m.j {
            Some(OpcodeTag::Insert)
        } else {
            None
        };

        if let Some(t) = tag {
            opcodes.push((t, i, m.i, j, m.j));
        }
        if m.n > 0 {
            opcodes.push((OpcodeTag::Equal, m.i, m.i + m.n, m.j, m.j + m.n));
        }
        i = m.i + m.n;
        j = m.j + m.n;
    }

    Ok(opcodes)
}

/// Indices into `a` of every item removed on the way to `b`, ascending.
///
/// An item counts as removed when it is deleted or replaced. Items that
/// survive but merely shift position are not reported.
pub fn removals<T: PartialEq>(
    a: &[T],
    b: &[T],
    interrupt: &dyn Fn() -> bool,
) -> Result<Vec<usize>, Interrupted> {
    Ok(opcodes(a, b, interrupt)?
        .into_iter()
        .filter(|(tag, ..)| matches!(tag, OpcodeTag::Delete | OpcodeTag::Replace))
        .flat_map(|(_, i1, i2, _, _)| i1..i2)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn diff_ops<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Opcode> {
        opcodes(a, b, &|| false).unwrap()
    }

    fn diff_removals<T: PartialEq>(a: &[T], b: &[T]) -> Vec<usize> {
        removals(a, b, &|| false).unwrap()
    }

    /// Length of the longest common subsequence, by dynamic programming.
    fn lcs_len(a: &[char], b: &[char]) -> usize {
        let mut row = vec![0usize; b.len() + 1];
        for x in a {
            let mut prev = 0;
            for (j, y) in b.iter().enumerate() {
                let tmp = row[j + 1];
                row[j + 1] = if x == y { prev + 1 } else { row[j + 1].max(row[j]) };
                prev = tmp;
            }
        }
        row[b.len()]
    }

    #[test]
    fn test_opcodes_simple_replace() {
        let before = ["line1", "line2", "line3"];
        let after = ["line1", "modified", "line3"];
        assert_eq!(
            diff_ops(&before, &after),
            vec![
                (OpcodeTag::Equal, 0, 1, 0, 1),
                (OpcodeTag::Replace, 1, 2, 1, 2),
                (OpcodeTag::Equal, 2, 3, 2, 3),
            ]
        );
    }

    #[test]
    fn test_opcodes_insert() {
        let before = ["line1", "line3"];
        let after = ["line1", "line2", "line3"];
        assert_eq!(
            diff_ops(&before, &after),
            vec![
                (OpcodeTag::Equal, 0, 1, 0, 1),
                (OpcodeTag::Insert, 1, 1, 1, 2),
                (OpcodeTag::Equal, 1, 2, 2, 3),
            ]
        );
        assert!(diff_removals(&before, &after).is_empty());
    }

    #[test]
    fn test_opcodes_delete() {
        let before = ["line1", "line2", "line3"];
        let after = ["line1", "line3"];
        assert_eq!(diff_removals(&before, &after), vec![1]);
    }

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(diff_ops(&chars("abc"), &chars("abc")), vec![(OpcodeTag::Equal, 0, 3, 0, 3)]);
        assert!(diff_ops::<char>(&[], &[]).is_empty());
        assert_eq!(diff_removals(&chars("abc"), &[]), vec![0, 1, 2]);
        assert!(diff_removals(&[], &chars("abc")).is_empty());
    }

    #[test]
    fn test_removals_ignore_shifted_items() {
        // "x" is gone and "?" appears elsewhere; "bcd" only shifts.
        let a = chars("axbcd");
        let b = chars("abcd?");
        assert_eq!(diff_removals(&a, &b), vec![1]);
    }

    #[test]
    fn test_removals_with_expanding_substitution() {
        let a = chars("a€b");
        let b = chars("a&#8364;b");
        assert_eq!(diff_removals(&a, &b), vec![1]);
    }

    #[test]
    fn test_edit_script_is_minimal() {
        let cases = [
            ("ABCABBA", "CBABAC"),
            ("kitten", "sitting"),
            ("the quick brown fox", "a quick brown dog"),
            ("aaaaab", "baaaaa"),
            ("abcdefghij", "jihgfedcba"),
        ];
        for (a, b) in cases {
            let (a, b) = (chars(a), chars(b));
            let kept: usize = diff_ops(&a, &b)
                .iter()
                .filter(|(tag, ..)| *tag == OpcodeTag::Equal)
                .map(|(_, i1, i2, _, _)| i2 - i1)
                .sum();
            assert_eq!(kept, lcs_len(&a, &b), "{:?} -> {:?}", a, b);
            assert_eq!(diff_removals(&a, &b).len(), a.len() - lcs_len(&a, &b));
        }
    }

    #[test]
    fn test_opcodes_cover_both_sequences() {
        let a = chars("the quick brown fox");
        let b = chars("a quick brown dog");
        let ops = diff_ops(&a, &b);
        let (mut i, mut j) = (0, 0);
        for (tag, i1, i2, j1, j2) in ops {
            assert_eq!((i1, j1), (i, j));
            if tag == OpcodeTag::Equal {
                assert_eq!(a[i1..i2], b[j1..j2]);
            }
            i = i2;
            j = j2;
        }
        assert_eq!((i, j), (a.len(), b.len()));
    }

    #[test]
    fn test_interrupt_stops_the_diff() {
        use std::cell::Cell;

        // Every other item changes, so the diff needs many snake searches.
        let a: Vec<usize> = (0..2_000).collect();
        let b: Vec<usize> = (0..2_000).map(|i| if i % 2 == 0 { i } else { i + 10_000 }).collect();

        let polls = Cell::new(0);
        let interrupt = || {
            polls.set(polls.get() + 1);
            polls.get() > 5
        };
        assert_eq!(removals(&a, &b, &interrupt), Err(Interrupted));
        assert_eq!(polls.get(), 6);
    }

    #[test]
    fn test_trivial_diff_never_polls() {
        let interrupt = || -> bool { panic!("polled") };
        assert_eq!(removals(&chars("abc"), &chars("abc"), &interrupt), Ok(Vec::new()));
        assert_eq!(removals(&chars("abc"), &chars("ab"), &interrupt), Ok(vec![2]));
    }
}
