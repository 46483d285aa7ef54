//! Candidate generation: one function per typosquatting technique, plus the
//! filter and the `Generation` configuration that ties them together.

use crate::config::MAX_DOMAIN_LENGTH;
use crate::dictionary;
use crate::glyphs::confusables;
use crate::keyboard::LAYOUTS;
use crate::model::{Candidate, Fuzzer};
use crate::tld::Target;
use std::collections::HashSet;

const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];
const BIT_MASKS: [u32; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
const PREFIXES: [&str; 3] = ["ww", "www", "www-"];

/// Which generators run for a target. The core techniques always run;
/// the dictionary step is optional.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    dictionary: Option<Vec<String>>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dictionary(mut self, words: Vec<String>) -> Self {
        self.dictionary = Some(words);
        self
    }

    pub fn candidates(&self, target: &Target) -> Vec<Candidate> {
        let mut candidates = generate(target);
        if let Some(words) = &self.dictionary {
            candidates.extend(dictionary::generate(target, words));
        }
        filter_candidates(candidates)
    }
}

/// Runs every technique against `target.name`, original first.
pub fn generate(target: &Target) -> Vec<Candidate> {
    let Target { name, tld } = target;
    let mut candidates = vec![Candidate::new(Fuzzer::Original, target.domain())];

    let techniques: [(Fuzzer, fn(&str) -> Vec<String>); 11] = [
        (Fuzzer::Addition, generate_addition),
        (Fuzzer::Bitsquatting, generate_bitsquatting),
        (Fuzzer::Homoglyph, generate_homoglyphs),
        (Fuzzer::Hyphenation, generate_hyphenation),
        (Fuzzer::Insertion, generate_insertion),
        (Fuzzer::Omission, generate_omission),
        (Fuzzer::Repetition, generate_repetition),
        (Fuzzer::Replacement, generate_replacement),
        (Fuzzer::Subdomain, generate_subdomain_injection),
        (Fuzzer::Transposition, generate_transposition),
        (Fuzzer::VowelSwap, generate_vowel_swapping),
    ];
    for (fuzzer, technique) in techniques {
        candidates.extend(
            technique(name)
                .into_iter()
                .map(|variant| Candidate::new(fuzzer, format!("{}.{}", variant, tld))),
        );
    }

    candidates.extend(
        generate_various(name)
            .into_iter()
            .map(|variant| Candidate::new(Fuzzer::Various, format!("{}.{}", variant, tld))),
    );
    candidates.extend(
        generate_tld_variations(name, tld)
            .into_iter()
            .map(|domain| Candidate::new(Fuzzer::Various, domain)),
    );

    candidates
}

/// Drops overlong names and keeps the first occurrence of each name.
pub fn filter_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| is_valid_domain(&candidate.domain_name))
        .filter(|candidate| seen.insert(candidate.domain_name.clone()))
        .collect()
}

fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    domain.chars().count() <= MAX_DOMAIN_LENGTH
}

/// `chars[..at] + insert + chars[at + skip..]`
fn splice(chars: &[char], at: usize, skip: usize, insert: &str) -> String {
    let mut out: String = chars[..at].iter().collect();
    out.push_str(insert);
    out.extend(&chars[at + skip..]);
    out
}

fn unique(variations: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    variations
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

pub fn generate_addition(domain: &str) -> Vec<String> {
    ('a'..='z').map(|ch| format!("{}{}", domain, ch)).collect()
}

pub fn generate_bitsquatting(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let mut variations = Vec::new();

    for (i, &ch) in chars.iter().enumerate() {
        for mask in BIT_MASKS {
            let Some(flipped) = char::from_u32(ch as u32 ^ mask) else {
                continue;
            };
            if flipped.is_ascii_lowercase() || flipped.is_ascii_digit() || flipped == '-' {
                variations.push(splice(&chars, i, 1, &flipped.to_string()));
            }
        }
    }

    variations
}

/// Slides windows of every size over the name and swaps in look-alikes for
/// the first occurrence of each window character.
pub fn generate_homoglyphs(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let len = chars.len();
    let mut variations = Vec::new();

    for ws in 1..=len {
        for i in 0..=(len - ws) {
            let window = &chars[i..i + ws];
            for (j, &ch) in window.iter().enumerate() {
                let Some(glyphs) = confusables(ch) else {
                    continue;
                };
                let first = window.iter().position(|&w| w == ch).unwrap_or(j);
                for glyph in glyphs {
                    variations.push(splice(&chars, i + first, 1, glyph));
                }
            }
        }
    }

    unique(variations)
}

pub fn generate_hyphenation(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let variations = (1..chars.len())
        .map(|i| splice(&chars, i, 0, "-"))
        .collect();
    unique(variations)
}

pub fn generate_insertion(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let mut variations = Vec::new();

    for i in 1..chars.len().saturating_sub(1) {
        let ch = chars[i];
        for layout in LAYOUTS {
            let Some(keys) = layout.adjacent(ch) else {
                continue;
            };
            for key in keys.chars() {
                variations.push(splice(&chars, i, 1, &format!("{}{}", key, ch)));
                variations.push(splice(&chars, i, 1, &format!("{}{}", ch, key)));
            }
        }
    }

    unique(variations)
}

pub fn generate_omission(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    if chars.len() < 2 {
        return Vec::new();
    }
    let variations = (0..chars.len())
        .map(|i| splice(&chars, i, 1, ""))
        .collect();
    unique(variations)
}

pub fn generate_repetition(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let variations = chars
        .iter()
        .enumerate()
        .map(|(i, &ch)| splice(&chars, i, 1, &format!("{}{}", ch, ch)))
        .collect();
    unique(variations)
}

pub fn generate_replacement(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let mut variations = Vec::new();

    for (i, &ch) in chars.iter().enumerate() {
        for layout in LAYOUTS {
            if let Some(keys) = layout.adjacent(ch) {
                for key in keys.chars() {
                    variations.push(splice(&chars, i, 1, &key.to_string()));
                }
            }
        }
    }

    unique(variations)
}

/// Turns the tail of the name into a subdomain label. A dot is never put
/// next to an existing dot or hyphen.
pub fn generate_subdomain_injection(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let separator = |c: char| c == '-' || c == '.';
    let variations = (1..chars.len())
        .filter(|&i| !separator(chars[i]) && !separator(chars[i - 1]))
        .map(|i| splice(&chars, i, 0, "."))
        .collect();
    unique(variations)
}

pub fn generate_transposition(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let variations = chars
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] != pair[1])
        .map(|(i, pair)| splice(&chars, i, 2, &format!("{}{}", pair[1], pair[0])))
        .collect();
    unique(variations)
}

pub fn generate_vowel_swapping(domain: &str) -> Vec<String> {
    let chars: Vec<char> = domain.chars().collect();
    let mut variations = Vec::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !VOWELS.contains(&ch) {
            continue;
        }
        for vowel in VOWELS.iter().filter(|&&v| v != ch) {
            variations.push(splice(&chars, i, 1, &vowel.to_string()));
        }
    }

    unique(variations)
}

pub fn generate_various(domain: &str) -> Vec<String> {
    if domain.starts_with("www.") {
        return Vec::new();
    }
    PREFIXES
        .iter()
        .map(|prefix| format!("{}{}", prefix, domain))
        .collect()
}

/// Full domain names (already suffixed) built by playing with the TLD.
pub fn generate_tld_variations(domain: &str, tld: &str) -> Vec<String> {
    let mut variations = Vec::new();

    match tld.rsplit_once('.') {
        Some((_, last)) => {
            variations.push(format!("{}.{}", domain, last));
            variations.push(format!("{}{}", domain, tld));
        }
        None => {
            variations.push(format!("{}{}.{}", domain, tld, tld));
            if tld != "com" {
                variations.push(format!("{}-{}.com", domain, tld));
            }
        }
    }

    variations
}
