/// Physical keyboard layout: every key with the keys around it.
pub struct Keyboard {
    pub name: &'static str,
    keys: &'static [(char, &'static str)],
}

impl Keyboard {
    pub fn adjacent(&self, key: char) -> Option<&'static str> {
        self.keys
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, near)| *near)
    }
}

pub static QWERTY: Keyboard = Keyboard {
    name: "qwerty",
    keys: &[
        ('1', "2q"), ('2', "3wq1"), ('3', "4ew2"), ('4', "5re3"), ('5', "6tr4"),
        ('6', "7yt5"), ('7', "8uy6"), ('8', "9iu7"), ('9', "0oi8"), ('0', "po9"),
        ('q', "12wa"), ('w', "3esaq2"), ('e', "4rdsw3"), ('r', "5tfde4"), ('t', "6ygfr5"),
        ('y', "7uhgt6"), ('u', "8ijhy7"), ('i', "9okju8"), ('o', "0plki9"), ('p', "lo0"),
        ('a', "qwsz"), ('s', "edxzaw"), ('d', "rfcxse"), ('f', "tgvcdr"), ('g', "yhbvft"),
        ('h', "ujnbgy"), ('j', "ikmnhu"), ('k', "olmji"), ('l', "kop"),
        ('z', "asx"), ('x', "zsdc"), ('c', "xdfv"), ('v', "cfgb"), ('b', "vghn"),
        ('n', "bhjm"), ('m', "njk"),
    ],
};

pub static QWERTZ: Keyboard = Keyboard {
    name: "qwertz",
    keys: &[
        ('1', "2q"), ('2', "3wq1"), ('3', "4ew2"), ('4', "5re3"), ('5', "6tr4"),
        ('6', "7zt5"), ('7', "8uz6"), ('8', "9iu7"), ('9', "0oi8"), ('0', "po9"),
        ('q', "12wa"), ('w', "3esaq2"), ('e', "4rdsw3"), ('r', "5tfde4"), ('t', "6zgfr5"),
        ('z', "7uhgt6"), ('u', "8ijhz7"), ('i', "9okju8"), ('o', "0plki9"), ('p', "lo0"),
        ('a', "qwsy"), ('s', "edxyaw"), ('d', "rfcxse"), ('f', "tgvcdr"), ('g', "zhbvft"),
        ('h', "ujnbgz"), ('j', "ikmnhu"), ('k', "olmji"), ('l', "kop"),
        ('y', "asx"), ('x', "ysdc"), ('c', "xdfv"), ('v', "cfgb"), ('b', "vghn"),
        ('n', "bhjm"), ('m', "njk"),
    ],
};

pub static AZERTY: Keyboard = Keyboard {
    name: "azerty",
    keys: &[
        ('1', "2a"), ('2', "3za1"), ('3', "4ez2"), ('4', "5re3"), ('5', "6tr4"),
        ('6', "7yt5"), ('7', "8uy6"), ('8', "9iu7"), ('9', "0oi8"), ('0', "po9"),
        ('a', "2zq1"), ('z', "3esqa2"), ('e', "4rdsz3"), ('r', "5tfde4"), ('t', "6ygfr5"),
        ('y', "7uhgt6"), ('u', "8ijhy7"), ('i', "9okju8"), ('o', "0plki9"), ('p', "lo0m"),
        ('q', "zswa"), ('s', "edxwqz"), ('d', "rfcxse"), ('f', "tgvcdr"), ('g', "yhbvft"),
        ('h', "ujnbgy"), ('j', "iknhu"), ('k', "olji"), ('l', "kopm"), ('m', "lp"),
        ('w', "sxq"), ('x', "zsdc"), ('c', "xdfv"), ('v', "cfgb"), ('b', "vghn"),
        ('n', "bhj"),
    ],
};

pub static LAYOUTS: [&Keyboard; 3] = [&QWERTY, &QWERTZ, &AZERTY];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_differ_where_expected() {
        assert_eq!(QWERTY.adjacent('y'), Some("7uhgt6"));
        assert_eq!(QWERTZ.adjacent('y'), Some("asx"));
        assert_eq!(AZERTY.adjacent('a'), Some("2zq1"));
        assert_eq!(QWERTY.adjacent('-'), None);
    }

    #[test]
    fn test_every_layout_covers_letters_and_digits() {
        for layout in LAYOUTS {
            for key in ('a'..='z').chain('0'..='9') {
                assert!(layout.adjacent(key).is_some(), "{} misses {}", layout.name, key);
            }
        }
    }
}
