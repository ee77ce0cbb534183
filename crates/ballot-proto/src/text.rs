// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Custom-emoji segmentation.
//!
//! Text is scanned once, left to right, into literal runs and `:shortcode:`
//! references that resolve against a poll's emoji map. Shortcodes are only
//! ever compared as map keys; no pattern is built from user text.

use std::collections::BTreeMap;

/// A piece of displayable text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, to be escaped by the renderer.
    Text(&'a str),
    /// A resolved custom emoji.
    Emoji {
        /// Shortcode without colons.
        shortcode: &'a str,
        /// Image URL.
        url: &'a str,
    },
}

/// Split `text` into segments using `emoji` (shortcode → URL).
///
/// Unknown `:word:` sequences stay literal. The closing colon of an unknown
/// sequence may open the next shortcode (`a:x:cheese:` still resolves
/// `cheese`).
pub fn segments<'a>(text: &'a str, emoji: &'a BTreeMap<String, String>) -> Vec<Segment<'a>> {
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;
    while let Some(open_rel) = text[cursor..].find(':') {
        let open = cursor + open_rel;
        let body_start = open + 1;
        let Some(close_rel) = text[body_start..].find(':') else {
            break;
        };
        let close = body_start + close_rel;
        let code = &text[body_start..close];
        if let Some(url) = emoji.get(code) {
            if literal_start < open {
                out.push(Segment::Text(&text[literal_start..open]));
            }
            out.push(Segment::Emoji {
                shortcode: code,
                url,
            });
            cursor = close + 1;
            literal_start = cursor;
        } else {
            cursor = close;
        }
    }
    if literal_start < text.len() {
        out.push(Segment::Text(&text[literal_start..]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn plain_text_is_one_segment() {
        let emoji = map(&[]);
        assert_eq!(segments("Cheese?", &emoji), vec![Segment::Text("Cheese?")]);
    }

    #[test]
    fn empty_text_has_no_segments() {
        assert!(segments("", &map(&[])).is_empty());
    }

    #[test]
    fn resolves_known_shortcodes_between_literals() {
        let emoji = map(&[("cheese", "https://c"), ("wine", "https://w")]);
        assert_eq!(
            segments("I like :cheese: and :wine:", &emoji),
            vec![
                Segment::Text("I like "),
                Segment::Emoji {
                    shortcode: "cheese",
                    url: "https://c"
                },
                Segment::Text(" and "),
                Segment::Emoji {
                    shortcode: "wine",
                    url: "https://w"
                },
            ]
        );
    }

    #[test]
    fn unknown_shortcode_stays_literal_and_its_closing_colon_can_reopen() {
        let emoji = map(&[("cheese", "https://c")]);
        assert_eq!(
            segments("time 10:30:cheese: ok", &emoji),
            vec![
                Segment::Text("time 10:30"),
                Segment::Emoji {
                    shortcode: "cheese",
                    url: "https://c"
                },
                Segment::Text(" ok"),
            ]
        );
    }

    #[test]
    fn adjacent_emoji_and_unterminated_colon() {
        let emoji = map(&[("a", "u1")]);
        assert_eq!(
            segments(":a::a: :a", &emoji),
            vec![
                Segment::Emoji {
                    shortcode: "a",
                    url: "u1"
                },
                Segment::Emoji {
                    shortcode: "a",
                    url: "u1"
                },
                Segment::Text(" :a"),
            ]
        );
    }

    #[test]
    fn regex_metacharacters_in_shortcodes_are_just_keys() {
        let emoji = map(&[(".*", "u")]);
        assert_eq!(
            segments("x :.*: y :ab:", &emoji),
            vec![
                Segment::Text("x "),
                Segment::Emoji {
                    shortcode: ".*",
                    url: "u"
                },
                Segment::Text(" y :ab:"),
            ]
        );
    }
}
