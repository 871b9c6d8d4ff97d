//! Compound-keyword normalization.
//!
//! Option keywords like `id-by` and `added-since` may be typed as two words
//! (`id by`), hyphenated (`id-by`), or fused (`idby`). This pass folds all
//! three spellings into a single [`Token::Compound`] carrying the canonical
//! hyphenated form, before the grammar engine runs, so the grammar only ever
//! sees one spelling.
//!
//! The pass is driven entirely by the [`KeywordConfig`] compound table and
//! scans left to right, greedily merging any adjacent word pair the table
//! recognizes. Quoted phrases are never touched and never merged across.
//! Spans always refer to the original source text: a merged pair carries the
//! union of its parts' spans.

use lacewing_core::KeywordConfig;

use crate::tokens::{PositionedToken, Token};

/// Fold compound keyword spellings into `Compound` tokens.
pub fn normalize<'src>(
    tokens: Vec<PositionedToken<'src>>,
    config: &KeywordConfig,
) -> Vec<PositionedToken<'src>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(tok) = iter.next() {
        let first = match &tok.token {
            Token::Word(word) => Some(*word),
            _ => None,
        };

        if let Some(first) = first {
            // Adjacent pair: `id by` -> `id-by`
            let merged = match iter.peek().map(|next| &next.token) {
                Some(Token::Word(second)) => config.compound_of(first, second),
                _ => None,
            };
            if let Some(canonical) = merged {
                let second = iter.next().expect("peeked token present");
                out.push(PositionedToken::new(
                    Token::Compound(canonical),
                    tok.span.union(second.span),
                ));
                continue;
            }

            // Single-token spellings: `id-by` or `idby`
            if let Some(canonical) = config.compound_of_single(first) {
                out.push(PositionedToken::new(Token::Compound(canonical), tok.span));
                continue;
            }
        }

        out.push(tok);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::span::Span;

    fn normalized(input: &str) -> Vec<Token<'_>> {
        let config = KeywordConfig::standard();
        normalize(tokenize(input).expect("tokenize failed"), &config)
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_all_three_spellings_normalize_alike() {
        let expected = vec![Token::Compound("id-by".to_string())];
        assert_eq!(normalized("id by"), expected);
        assert_eq!(normalized("idby"), expected);
        assert_eq!(normalized("id-by"), expected);
    }

    #[test]
    fn test_pair_merge_spans_union() {
        let config = KeywordConfig::standard();
        let tokens = normalize(tokenize("id by ben").unwrap(), &config);
        assert_eq!(tokens[0].span, Span::new(0..5));
        assert_eq!(tokens[1].token, Token::Word("ben"));
    }

    #[test]
    fn test_added_date_phrases() {
        assert_eq!(
            normalized("added since june"),
            vec![
                Token::Compound("added-since".to_string()),
                Token::Word("june"),
            ]
        );
        assert_eq!(
            normalized("addedon"),
            vec![Token::Compound("added-on".to_string())]
        );
    }

    #[test]
    fn test_project_phrase() {
        assert_eq!(
            normalized("in prj snow"),
            vec![
                Token::Compound("in-prj".to_string()),
                Token::Word("snow"),
            ]
        );
    }

    #[test]
    fn test_unrelated_pairs_untouched() {
        assert_eq!(
            normalized("not ben"),
            vec![Token::Word("not"), Token::Word("ben")]
        );
        assert_eq!(
            normalized("in animalia"),
            vec![Token::Word("in"), Token::Word("animalia")]
        );
    }

    #[test]
    fn test_quoted_phrases_never_merge() {
        assert_eq!(
            normalized(r#""id by""#),
            vec![Token::Quoted("id by".to_string())]
        );
        // A quote boundary between the words blocks the merge.
        assert_eq!(
            normalized(r#"id "by""#),
            vec![Token::Word("id"), Token::Quoted("by".to_string())]
        );
    }

    #[test]
    fn test_case_insensitive_merge() {
        assert_eq!(
            normalized("Added Since june"),
            vec![
                Token::Compound("added-since".to_string()),
                Token::Word("june"),
            ]
        );
    }

    #[test]
    fn test_greedy_left_to_right() {
        // `sort by` merges; the following `by` stays a plain word.
        assert_eq!(
            normalized("sort by by"),
            vec![
                Token::Compound("sort-by".to_string()),
                Token::Word("by"),
            ]
        );
    }
}
