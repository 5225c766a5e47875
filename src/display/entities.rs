//! HTML entity decoding for question and answer text.
//!
//! Upstream trivia sources escape text for HTML (`&#039;`, `&quot;`,
//! `&Delta;`), and the API forwards it verbatim. Decoding is display-only:
//! the raw string is what the server compares against, so it is what gets
//! submitted.

use std::borrow::Cow;

/// Decode every named and numeric HTML entity. Unknown entities are left as
/// written.
pub fn decode_html_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    html_escape::decode_html_entities(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(decode_html_entities("2+2?"), Cow::Borrowed("2+2?")));
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(
            decode_html_entities("Who&#039;s there? &#x27;x&#x27;"),
            "Who's there? 'x'"
        );
    }

    #[test]
    fn test_named_entities() {
        assert_eq!(
            decode_html_entities("&quot;Pok&eacute;mon&quot; &amp; friends"),
            "\"Pokémon\" & friends"
        );
    }

    #[test]
    fn test_greek_and_symbol_entities() {
        assert_eq!(
            decode_html_entities("&Delta;&alpha;&Omega; &hearts; &rarr; &Ecirc; 1&ordm;"),
            "Δ\u{3b1}Ω ♥ → Ê 1º"
        );
    }

    #[test]
    fn test_direction_marks() {
        assert_eq!(decode_html_entities("&lrm;abc"), "\u{200e}abc");
    }

    #[test]
    fn test_unknown_entities_are_untouched() {
        assert_eq!(decode_html_entities("&bogus; & more"), "&bogus; & more");
    }

    #[test]
    fn test_no_double_decoding() {
        assert_eq!(decode_html_entities("&amp;quot;"), "&quot;");
    }
}
