//! Context-triggered piecewise hashing, compatible with the ssdeep format
//! `blocksize:hash1:hash2`.

use std::cmp;
use std::fmt;
use std::str::FromStr;

const ROLLING_WINDOW: usize = 7;
const MIN_BLOCKSIZE: u32 = 3;
const HASH_PRIME: u32 = 0x0100_0193;
const HASH_INIT: u32 = 0x2802_1967;
const SPAMSUM_LENGTH: usize = 64;
const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyHash {
    block_size: u32,
    first: String,
    second: String,
}

struct RollingHash {
    window: [u8; ROLLING_WINDOW],
    h1: u32,
    h2: u32,
    h3: u32,
    n: usize,
}

impl RollingHash {
    fn new() -> Self {
        Self {
            window: [0; ROLLING_WINDOW],
            h1: 0,
            h2: 0,
            h3: 0,
            n: 0,
        }
    }

    fn update(&mut self, c: u8) -> u32 {
        let c32 = c as u32;
        let slot = self.n % ROLLING_WINDOW;

        self.h2 = self
            .h2
            .wrapping_sub(self.h1)
            .wrapping_add((ROLLING_WINDOW as u32).wrapping_mul(c32));
        self.h1 = self
            .h1
            .wrapping_add(c32)
            .wrapping_sub(self.window[slot] as u32);
        self.window[slot] = c;
        self.n += 1;
        self.h3 = (self.h3 << 5) ^ c32;

        self.h1.wrapping_add(self.h2).wrapping_add(self.h3)
    }
}

fn sum_hash(c: u8, h: u32) -> u32 {
    h.wrapping_mul(HASH_PRIME) ^ c as u32
}

fn b64(h: u32) -> char {
    B64[(h % 64) as usize] as char
}

/// Too few triggers at this block size means a finer one fits the data better.
fn retry_smaller(block_size: u32, triggers: usize) -> bool {
    block_size > MIN_BLOCKSIZE && triggers < SPAMSUM_LENGTH / 2
}

impl FuzzyHash {
    pub fn hash(data: &[u8]) -> Self {
        let mut block_size = MIN_BLOCKSIZE;
        while (block_size as usize) * SPAMSUM_LENGTH < data.len() {
            block_size *= 2;
        }

        loop {
            let (first, second, triggers) = Self::digest(data, block_size);
            if retry_smaller(block_size, triggers) {
                block_size /= 2;
                continue;
            }
            return Self {
                block_size,
                first,
                second,
            };
        }
    }

    /// Both signatures plus the number of block-size triggers, which leaves
    /// out the tail character appended after the last byte.
    fn digest(data: &[u8], block_size: u32) -> (String, String, usize) {
        let mut roll = RollingHash::new();
        let mut h1 = HASH_INIT;
        let mut h2 = HASH_INIT;
        let mut rh = 0;
        let mut first = String::new();
        let mut second = String::new();

        for &c in data {
            h1 = sum_hash(c, h1);
            h2 = sum_hash(c, h2);
            rh = roll.update(c);

            if rh % block_size == block_size - 1 && first.len() < SPAMSUM_LENGTH - 1 {
                first.push(b64(h1));
                h1 = HASH_INIT;
            }
            if rh % (block_size * 2) == block_size * 2 - 1 && second.len() < SPAMSUM_LENGTH / 2 - 1 {
                second.push(b64(h2));
                h2 = HASH_INIT;
            }
        }

        let triggers = first.len();
        if rh != 0 {
            first.push(b64(h1));
            second.push(b64(h2));
        }

        (first, second, triggers)
    }

    /// Similarity between two hashes, 0 (unrelated) to 100 (identical).
    pub fn compare(&self, other: &FuzzyHash) -> u32 {
        let b1 = self.block_size as u64;
        let b2 = other.block_size as u64;
        if b1 != b2 && b1 != b2 * 2 && b2 != b1 * 2 {
            return 0;
        }

        let s1 = eliminate_sequences(&self.first);
        let s2 = eliminate_sequences(&self.second);
        let t1 = eliminate_sequences(&other.first);
        let t2 = eliminate_sequences(&other.second);

        if b1 == b2 && s1 == t1 {
            return 100;
        }

        if b1 == b2 {
            cmp::max(score_strings(&s1, &t1, b1), score_strings(&s2, &t2, b1 * 2))
        } else if b1 == b2 * 2 {
            score_strings(&s1, &t2, b1)
        } else {
            score_strings(&s2, &t1, b2)
        }
    }
}

/// Runs of more than three identical characters carry little information.
fn eliminate_sequences(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    for (i, &b) in bytes.iter().enumerate() {
        if i >= 3 && b == bytes[i - 1] && b == bytes[i - 2] && b == bytes[i - 3] {
            continue;
        }
        out.push(b);
    }
    out
}

fn has_common_substring(s1: &[u8], s2: &[u8]) -> bool {
    if s1.len() < ROLLING_WINDOW || s2.len() < ROLLING_WINDOW {
        return false;
    }
    s1.windows(ROLLING_WINDOW)
        .any(|needle| s2.windows(ROLLING_WINDOW).any(|hay| hay == needle))
}

/// Levenshtein distance with substitutions weighted as delete + insert.
fn edit_distance(s1: &[u8], s2: &[u8]) -> usize {
    let mut prev: Vec<usize> = (0..=s2.len()).collect();
    let mut curr = vec![0; s2.len() + 1];

    for (i, &a) in s1.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &b) in s2.iter().enumerate() {
            let substitution = prev[j] + if a == b { 0 } else { 2 };
            curr[j + 1] = cmp::min(substitution, cmp::min(prev[j + 1] + 1, curr[j] + 1));
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2.len()]
}

fn score_strings(s1: &[u8], s2: &[u8], block_size: u64) -> u32 {
    if s1.len() > SPAMSUM_LENGTH || s2.len() > SPAMSUM_LENGTH {
        return 0;
    }
    if !has_common_substring(s1, s2) {
        return 0;
    }

    let distance = edit_distance(s1, s2) as u64;
    let mut score = distance * SPAMSUM_LENGTH as u64 / (s1.len() + s2.len()) as u64;
    score = 100 * score / SPAMSUM_LENGTH as u64;
    if score >= 100 {
        return 0;
    }
    score = 100 - score;

    // Small block sizes can't support a high score on short signatures.
    let threshold = (99 + ROLLING_WINDOW as u64) / ROLLING_WINDOW as u64 * MIN_BLOCKSIZE as u64;
    if block_size < threshold {
        let cap = block_size / MIN_BLOCKSIZE as u64 * cmp::min(s1.len(), s2.len()) as u64;
        score = cmp::min(score, cap);
    }

    score as u32
}

impl fmt::Display for FuzzyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.block_size, self.first, self.second)
    }
}

impl FromStr for FuzzyHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let block_size = parts
            .next()
            .and_then(|b| b.parse::<u32>().ok())
            .filter(|b| *b >= MIN_BLOCKSIZE)
            .ok_or_else(|| format!("bad block size in {:?}", s))?;
        let first = parts.next().ok_or_else(|| format!("missing hash in {:?}", s))?;
        let second = parts.next().ok_or_else(|| format!("missing hash in {:?}", s))?;
        Ok(Self {
            block_size,
            first: first.to_string(),
            second: second.to_string(),
        })
    }
}
