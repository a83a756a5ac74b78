//! Sentence-boundary text segmentation.
//!
//! The synthesis engine mis-renders strong terminal punctuation (robotic
//! pauses, spoken "dot"), so terminal `.` and `…` are downgraded to `;` —
//! a softer break the engine handles well — and the true segment boundaries
//! are recovered here, out-of-band, instead of re-parsing punctuation after
//! synthesis. All other punctuation (`!?:;,"'`) passes through verbatim.

/// Splits `text` into speakable units at sentence-ending punctuation only.
///
/// A `.` is a boundary when it sits at a word boundary (followed by
/// whitespace or end-of-string) and is not preceded by a digit, so decimals
/// like `2.5` stay intact. An `…` at a word boundary is also a boundary.
/// Each unit is trimmed, the boundary punctuation is replaced by `;`, and
/// empty units are dropped. Input with no boundary comes back as a single
/// unit; blank input yields an empty vector.
pub fn segment(text: &str) -> Vec<String> {
    // Pass 1: classify terminal punctuation and record split offsets.
    let boundaries = find_boundaries(text);

    if boundaries.is_empty() {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![trimmed.to_string()];
    }

    // Pass 2: slice at the recorded offsets.
    let mut segments = Vec::with_capacity(boundaries.len() + 1);
    let mut cursor = 0usize;
    for &(punct_start, punct_end) in &boundaries {
        let body = text[cursor..punct_start].trim();
        if !body.is_empty() {
            segments.push(format!("{};", body));
        }
        cursor = punct_end;
    }
    let tail = text[cursor..].trim();
    if !tail.is_empty() {
        segments.push(tail.to_string());
    }
    segments
}

/// Byte ranges of boundary punctuation: `(start, end)` of the `.`/`…` itself.
fn find_boundaries(text: &str) -> Vec<(usize, usize)> {
    let mut boundaries = Vec::new();
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        let at_word_end = next.map_or(true, |c| c.is_whitespace());
        let is_boundary = match ch {
            '.' => at_word_end && !prev.map_or(false, |p| p.is_ascii_digit()),
            '…' => at_word_end,
            _ => false,
        };
        if is_boundary {
            boundaries.push((idx, idx + ch.len_utf8()));
        }
        prev = Some(ch);
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_yields_nothing() {
        assert!(segment("").is_empty());
        assert!(segment("   \n\t ").is_empty());
    }

    #[test]
    fn text_without_boundary_is_one_unit() {
        assert_eq!(segment("Hello, how are you?"), vec!["Hello, how are you?"]);
        assert_eq!(segment("  padded text  "), vec!["padded text"]);
    }

    #[test]
    fn splits_at_terminal_dots() {
        assert_eq!(segment("A. B. C."), vec!["A;", "B;", "C;"]);
    }

    #[test]
    fn no_terminal_dot_survives_in_output() {
        for unit in segment("First sentence. Second sentence.") {
            assert!(!unit.ends_with('.'), "unit still ends with '.': {unit}");
        }
    }

    #[test]
    fn decimals_are_not_boundaries() {
        assert_eq!(segment("o valor é 2.5"), vec!["o valor é 2.5"]);
        // A decimal mid-sentence must not split even with a real boundary later.
        assert_eq!(
            segment("custa 2.5 reais. fim"),
            vec!["custa 2.5 reais;", "fim"]
        );
    }

    #[test]
    fn ellipsis_is_a_boundary() {
        assert_eq!(segment("espera… depois"), vec!["espera;", "depois"]);
        assert_eq!(segment("espera…"), vec!["espera;"]);
    }

    #[test]
    fn other_punctuation_is_preserved() {
        assert_eq!(
            segment("Sério?! Sim: claro, \"óbvio\". fim"),
            vec!["Sério?! Sim: claro, \"óbvio\";", "fim"]
        );
    }

    #[test]
    fn dot_inside_word_is_kept() {
        assert_eq!(segment("visite site.example agora"), vec!["visite site.example agora"]);
    }

    #[test]
    fn trailing_text_after_last_boundary_is_kept() {
        assert_eq!(segment("Um. dois"), vec!["Um;", "dois"]);
    }
}
