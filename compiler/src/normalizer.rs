use crate::tokenizer::{Token, TokenKind};

/// Replaces per-line indentation with explicit `BlockOpen`/`BlockClose`
/// tokens so the parser never has to count indentation itself.
///
/// Indentation is compared only at the first token of each line. A deeper
/// line opens one block per extra level before that token. A shallower line
/// closes blocks in front of the newline that ended the previous line, so the
/// closes belong to the block that just ended. Anything still open at the end
/// of input is closed there. The output is always balanced.
pub fn normalize_blocks(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut indent_level  = 0;
    let mut streak        = 0;
    let mut after_newline = true;

    for token in tokens {
        if token.kind == TokenKind::Indent {
            streak += 1;
            continue;
        }

        if after_newline {
            if streak > indent_level {
                for _ in indent_level..streak {
                    out.push(Token::new(TokenKind::BlockOpen, token.line, token.column));
                }
            } else if streak < indent_level {
                let previous = out.pop();
                let (line, column) = previous
                    .as_ref()
                    .map_or((token.line, token.column), |p| (p.line, p.column));
                for _ in streak..indent_level {
                    out.push(Token::new(TokenKind::BlockClose, line, column));
                }
                out.extend(previous);
            }
            indent_level = streak;
        }

        streak = 0;
        after_newline = token.kind == TokenKind::Newline;
        out.push(token);
    }

    if matches!(out.last().map(|t| &t.kind), Some(TokenKind::Newline)) {
        out.pop();
    }
    let (line, column) = out.last().map_or((1, 1), |t| (t.line, t.column));
    for _ in 0..indent_level {
        out.push(Token::new(TokenKind::BlockClose, line, column));
    }

    out
}
