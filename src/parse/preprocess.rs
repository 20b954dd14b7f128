/// Strip insignificant whitespace from an expression.
///
/// Literal payloads are protected: once `&` is followed (after optional
/// whitespace) by `[`, everything up to and including the next `]` is copied
/// verbatim, so `&[{str}hello world]` keeps its space.
#[must_use]
pub fn preprocess(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();

    while let Some((i, ch)) = chars.next() {
        if ch == '&' {
            let after = &input[i + 1..];
            let trimmed = after.trim_start();
            if trimmed.starts_with('[') {
                out.push_str("&[");
                let skip = after.len() - trimmed.len();
                // consume the whitespace and the '['
                for _ in 0..=after[..skip].chars().count() {
                    chars.next();
                }
                for (_, inner) in chars.by_ref() {
                    out.push(inner);
                    if inner == ']' {
                        break;
                    }
                }
                continue;
            }
        }
        if !ch.is_whitespace() {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace() {
        assert_eq!(
            preprocess("<<op> $[a.b] #[+] \n\t $[c] >"),
            "<<op>$[a.b]#[+]$[c]>"
        );
    }

    #[test]
    fn protects_literal_payload() {
        assert_eq!(
            preprocess("$[name] ?[==] &[{str}hello world] "),
            "$[name]?[==]&[{str}hello world]"
        );
    }

    #[test]
    fn literal_with_space_before_bracket() {
        assert_eq!(preprocess("& [{str} a b ]"), "&[{str} a b ]");
    }

    #[test]
    fn unclosed_literal_copies_rest() {
        assert_eq!(preprocess("&[{str}a b"), "&[{str}a b");
    }

    #[test]
    fn empty_input() {
        assert_eq!(preprocess(""), "");
        assert_eq!(preprocess("   "), "");
    }

    #[test]
    fn ampersand_without_bracket_is_kept() {
        assert_eq!(preprocess("? [ && ]"), "?[&&]");
    }
}
