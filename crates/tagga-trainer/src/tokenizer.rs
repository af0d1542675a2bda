//! # Tokenizer for the CRF Tagger
//!
//! Splits free text into word and punctuation tokens for sequence labeling.
//! Offsets are char offsets, matching entity spans.

/// A token with its position in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text as it appears in the source
    pub text: String,
    /// Start char offset in the source
    pub start: usize,
    /// End char offset (exclusive) in the source
    pub end: usize,
    /// Token index in the sequence
    pub index: usize,
}

/// Tokenizer for free text.
///
/// Runs of alphanumeric chars form one token, every other non-whitespace
/// char is a token on its own, and whitespace only separates.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer;

impl Tokenizer {
    /// Create a new tokenizer instance.
    pub fn new() -> Self {
        Self
    }

    /// Tokenize a text into a sequence of tokens.
    ///
    /// # Examples
    /// ```
    /// use tagga_trainer::tokenizer::Tokenizer;
    ///
    /// let tokens = Tokenizer::new().tokenize("Knows C++, Rust");
    /// let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
    /// assert_eq!(texts, vec!["Knows", "C", "+", "+", ",", "Rust"]);
    /// ```
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut word_start = 0;

        for (pos, c) in input.chars().enumerate() {
            if c.is_alphanumeric() {
                if word.is_empty() {
                    word_start = pos;
                }
                word.push(c);
                continue;
            }

            if !word.is_empty() {
                Self::push(&mut tokens, std::mem::take(&mut word), word_start, pos);
            }
            if !c.is_whitespace() {
                Self::push(&mut tokens, c.to_string(), pos, pos + 1);
            }
        }

        if !word.is_empty() {
            let end = word_start + word.chars().count();
            Self::push(&mut tokens, word, word_start, end);
        }

        tokens
    }

    fn push(tokens: &mut Vec<Token>, text: String, start: usize, end: usize) {
        let index = tokens.len();
        tokens.push(Token {
            text,
            start,
            end,
            index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = Tokenizer::new().tokenize("Senior Rust developer");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].text, "Rust");
        assert_eq!(tokens[1].start, 7);
        assert_eq!(tokens[1].end, 11);
        assert_eq!(tokens[2].index, 2);
    }

    #[test]
    fn test_tokenize_punctuation() {
        let tokens = Tokenizer::new().tokenize("e-mail: a@b.c");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["e", "-", "mail", ":", "a", "@", "b", ".", "c"]);
    }

    #[test]
    fn test_tokenize_multibyte_offsets() {
        let tokens = Tokenizer::new().tokenize("Grüße aus Köln");
        assert_eq!(tokens[2].text, "Köln");
        assert_eq!((tokens[2].start, tokens[2].end), (10, 14));
    }

    #[test]
    fn test_tokenize_line_breaks() {
        let tokens = Tokenizer::new().tokenize("one\r\ntwo");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].start, 5);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(Tokenizer::new().tokenize("").is_empty());
        assert!(Tokenizer::new().tokenize(" \t\n").is_empty());
    }
}
