//! Devanagari to ITRANS transliteration.
//!
//! Character-level mapping over the Devanagari block (U+0900..U+097F).
//! Consonants carry an implicit `a` unless a dependent vowel sign or a
//! virama follows. Anything outside the block passes through unchanged.

const VIRAMA: char = '\u{094D}';

/// Transliterate Devanagari text to the ITRANS Latin scheme.
pub fn devanagari_to_itrans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(base) = consonant(c) {
            out.push_str(base);
            match chars.peek().copied() {
                Some(VIRAMA) => {
                    chars.next();
                }
                Some(next) => {
                    if let Some(vowel) = vowel_sign(next) {
                        out.push_str(vowel);
                        chars.next();
                    } else {
                        out.push('a');
                    }
                }
                None => out.push('a'),
            }
        } else if let Some(vowel) = independent_vowel(c) {
            out.push_str(vowel);
        } else if let Some(sign) = sign(c) {
            out.push_str(sign);
        } else if let Some(digit) = digit(c) {
            out.push(digit);
        } else {
            out.push(c);
        }
    }
    out
}

fn consonant(c: char) -> Option<&'static str> {
    Some(match c {
        'क' => "k",
        'ख' => "kh",
        'ग' => "g",
        'घ' => "gh",
        'ङ' => "~N",
        'च' => "ch",
        'छ' => "Ch",
        'ज' => "j",
        'झ' => "jh",
        'ञ' => "~n",
        'ट' => "T",
        'ठ' => "Th",
        'ड' => "D",
        'ढ' => "Dh",
        'ण' => "N",
        'त' => "t",
        'थ' => "th",
        'द' => "d",
        'ध' => "dh",
        'न' => "n",
        'प' => "p",
        'फ' => "ph",
        'ब' => "b",
        'भ' => "bh",
        'म' => "m",
        'य' => "y",
        'र' => "r",
        'ल' => "l",
        'व' => "v",
        'श' => "sh",
        'ष' => "Sh",
        'स' => "s",
        'ह' => "h",
        'ळ' => "L",
        // nukta forms
        '\u{0958}' => "q",
        '\u{0959}' => "K",
        '\u{095A}' => "G",
        '\u{095B}' => "z",
        '\u{095C}' => ".D",
        '\u{095D}' => ".Dh",
        '\u{095E}' => "f",
        _ => return None,
    })
}

fn independent_vowel(c: char) -> Option<&'static str> {
    Some(match c {
        'अ' => "a",
        'आ' => "A",
        'इ' => "i",
        'ई' => "I",
        'उ' => "u",
        'ऊ' => "U",
        'ऋ' => "R^i",
        'ॠ' => "R^I",
        'ऌ' => "L^i",
        'ॡ' => "L^I",
        'ए' => "e",
        'ऐ' => "ai",
        'ओ' => "o",
        'औ' => "au",
        _ => return None,
    })
}

fn vowel_sign(c: char) -> Option<&'static str> {
    Some(match c {
        'ा' => "A",
        'ि' => "i",
        'ी' => "I",
        'ु' => "u",
        'ू' => "U",
        'ृ' => "R^i",
        'ॄ' => "R^I",
        'ॢ' => "L^i",
        'ॣ' => "L^I",
        'े' => "e",
        'ै' => "ai",
        'ो' => "o",
        'ौ' => "au",
        _ => return None,
    })
}

fn sign(c: char) -> Option<&'static str> {
    Some(match c {
        'ं' => "M",
        'ः' => "H",
        'ँ' => ".N",
        'ऽ' => ".a",
        'ॐ' => "OM",
        '।' => ".",
        '॥' => "..",
        _ => return None,
    })
}

fn digit(c: char) -> Option<char> {
    match c {
        '०'..='९' => char::from_digit(c as u32 - '०' as u32, 10),
        _ => None,
    }
}
