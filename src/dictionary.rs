use crate::error::{Error, Result};
use crate::model::{Candidate, Fuzzer};
use crate::tld::Target;
use std::fs;
use std::path::Path;

/// Reads a word list. Blank lines and `//` comments are skipped.
pub fn load_dictionary(file_path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(file_path).map_err(|e| Error::dataset(file_path, e))?;
    Ok(parse_words(&data))
}

pub fn parse_words(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|word| !word.is_empty() && !word.starts_with("//"))
        .map(str::to_string)
        .collect()
}

/// Combines every word with the immediate label of the target name. Any
/// subdomain labels in front of it are kept as a prefix.
pub fn generate(target: &Target, words: &[String]) -> Vec<Candidate> {
    let (prefix, name) = match target.name.rsplit_once('.') {
        Some((prefix, name)) => (format!("{}.", prefix), name),
        None => (String::new(), target.name.as_str()),
    };

    let mut candidates = Vec::with_capacity(words.len() * 4);
    for word in words {
        for combined in [
            format!("{}-{}", name, word),
            format!("{}{}", name, word),
            format!("{}-{}", word, name),
            format!("{}{}", word, name),
        ] {
            candidates.push(Candidate::new(
                Fuzzer::Dictionary,
                format!("{}{}.{}", prefix, combined, target.tld),
            ));
        }
    }
    candidates
}
