//! Small helpers for the player-facing messages the engine emits.

/// Prefixes `noun` with "a" or "an".
pub fn with_article(noun: &str) -> String {
    let vowel = noun
        .chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'));
    if vowel {
        format!("an {noun}")
    } else {
        format!("a {noun}")
    }
}

/// Renders a counted noun: "a hand", "two hands", "no arms", "14 claws".
pub fn numbered_name(noun: &str, count: usize) -> String {
    match count {
        0 => format!("no {}", plural(noun)),
        1 => with_article(noun),
        n => format!("{} {}", number_word(n), plural(noun)),
    }
}

fn number_word(n: usize) -> String {
    const WORDS: [&str; 13] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve",
    ];
    WORDS.get(n).map_or_else(|| n.to_string(), |w| (*w).to_string())
}

fn plural(noun: &str) -> String {
    if noun.ends_with('s') || noun.ends_with('x') || noun.ends_with("ch") || noun.ends_with("sh") {
        format!("{noun}es")
    } else if let Some(stem) = noun.strip_suffix('y').filter(|s| {
        !s.ends_with(|c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
    }) {
        format!("{stem}ies")
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counted_nouns() {
        assert_eq!(numbered_name("hand", 1), "a hand");
        assert_eq!(numbered_name("arm", 1), "an arm");
        assert_eq!(numbered_name("hand", 2), "two hands");
        assert_eq!(numbered_name("claw", 14), "14 claws");
        assert_eq!(numbered_name("body", 0), "no bodies");
        assert_eq!(numbered_name("torch", 3), "three torches");
    }

    #[test]
    fn articles() {
        assert_eq!(with_article("evade"), "an evade");
        assert_eq!(with_article("strike"), "a strike");
    }
}
