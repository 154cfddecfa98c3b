use clap::ValueEnum;

/// String similarity metric used by the fuzzy join fallback. All metrics
/// score on a 0.0..=1.0 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Similarity {
    /// Ratcliff/Obershelp "gestalt" ratio over characters
    #[default]
    Gestalt,
    /// Jaro-Winkler
    JaroWinkler,
    /// 1 - levenshtein / max(len)
    Levenshtein,
}

impl Similarity {
    #[inline]
    pub fn score(self, a: &str, b: &str) -> f64 {
        match self {
            Similarity::Gestalt => gestalt_ratio(a, b),
            Similarity::JaroWinkler => strsim::jaro_winkler(a, b),
            Similarity::Levenshtein => strsim::normalized_levenshtein(a, b),
        }
    }
}

/// Ratcliff/Obershelp ratio: `2 * M / (|a| + |b|)` where `M` counts the
/// characters in the longest common block plus, recursively, the blocks
/// found to its left and right. Two empty strings score 1.0.
pub fn gestalt_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_block(&a[alo..ahi], &b[blo..bhi]);
        if size == 0 {
            continue;
        }
        matched += size;
        let (i, j) = (alo + i, blo + j);
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common contiguous block as `(start_in_a, start_in_b, len)`.
/// Ties go to the block that ends first in `a`, then first in `b`.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let len = cur[j + 1];
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}
