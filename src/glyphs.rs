/// Look-alike strings for each lowercase ASCII letter.
static GLYPHS: &[(char, &[&str])] = &[
    ('a', &["à", "á", "â", "ã", "ä", "å", "ɑ", "а", "ạ"]),
    ('b', &["d", "lb", "ib", "ʙ", "Ь", "ｂ"]),
    ('c', &["ϲ", "с", "ⅽ", "ƈ", "ċ", "ć"]),
    ('d', &["b", "cl", "dl", "di", "ԁ", "ժ", "ⅾ", "ｄ", "ɗ"]),
    ('e', &["é", "ê", "ë", "ē", "ĕ", "ė", "ｅ", "е", "ẹ", "ę"]),
    ('f', &["Ϝ", "Ｆ", "ｆ"]),
    ('g', &["q", "ɢ", "ɡ", "Ԍ", "Ԍ", "ｇ", "ġ"]),
    ('h', &["lh", "ih", "һ", "ｈ"]),
    ('i', &["1", "l", "Ꭵ", "ⅰ", "ｉ", "í", "ï"]),
    ('j', &["ј", "ｊ", "ʝ"]),
    ('k', &["lk", "ik", "lc", "κ", "ｋ"]),
    ('l', &["1", "i", "ⅼ", "ｌ"]),
    ('m', &["n", "nn", "rn", "rr", "ṃ", "ⅿ", "ｍ"]),
    ('n', &["m", "r", "ｎ", "ń"]),
    ('o', &["0", "Ο", "ο", "О", "о", "Օ", "Ｏ", "ｏ", "ȯ", "ọ", "ỏ", "ơ", "ó"]),
    ('p', &["ρ", "р", "ｐ"]),
    ('q', &["g", "ｑ", "զ"]),
    ('r', &["ʀ", "ｒ"]),
    ('s', &["Ⴝ", "Ꮪ", "Ｓ", "ｓ", "ʂ", "ś"]),
    ('t', &["τ", "ｔ"]),
    ('u', &["μ", "υ", "Ս", "Ｕ", "ｕ", "ս"]),
    ('v', &["ｖ", "ѵ", "ⅴ", "ν"]),
    ('w', &["vv", "ѡ", "ｗ"]),
    ('x', &["ⅹ", "ｘ", "х", "ҳ"]),
    ('y', &["ʏ", "γ", "у", "Ү", "ｙ", "ý"]),
    ('z', &["ｚ", "ʐ", "ż", "ź", "ʐ"]),
];

pub fn confusables(c: char) -> Option<&'static [&'static str]> {
    GLYPHS.iter().find(|(k, _)| *k == c).map(|(_, g)| *g)
}
