//! Turns a single preprocessed, marker-tagged line into a
//! [`Statement`], or `None` for a blank/comment-only line.

use crate::ast::{DataItem, Expr, Operand, Reg, Statement};
use crate::error::EvalError;
use crate::expr::Parser as ExprParser;
use crate::lexer::{tokenize, Token};

/// Splits a `[$filename$:line] rest` marked line into its parts.
#[must_use]
pub fn split_marker(line: &str) -> Option<(&str, u32, &str)> {
    let rest = line.strip_prefix("[$")?;
    let dollar = rest.find('$')?;
    let filename = &rest[..dollar];
    let after = &rest[dollar + 1..];
    let colon = after.strip_prefix(':')?;
    let bracket = colon.find(']')?;
    let line_no: u32 = colon[..bracket].parse().ok()?;
    let text = colon[bracket + 1..].strip_prefix(' ').unwrap_or(&colon[bracket + 1..]);
    Some((filename, line_no, text))
}

pub fn parse_line(text: &str) -> Result<Option<Statement>, EvalError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    parse_statement(&tokens).map(Some)
}

fn parse_statement(tokens: &[Token]) -> Result<Statement, EvalError> {
    // Label: `name:` or `.name:`
    if tokens.len() >= 2 {
        if let (Token::Ident(name), Token::Colon) = (&tokens[0], &tokens[1]) {
            return Ok(Statement::Label(name.clone()));
        }
    }

    if let Token::Ident(name) = &tokens[0] {
        // Define: `name = expr`
        if tokens.get(1) == Some(&Token::Eq) {
            if name.starts_with('.') {
                return Err(EvalError::DefineStartsWithDot(name.clone()));
            }
            let mut p = ExprParser::new(&tokens[2..]);
            let expr = p.parse_expr()?;
            return Ok(Statement::Define {
                name: name.clone(),
                expr,
            });
        }

        match name.to_ascii_lowercase().as_str() {
            "org" => {
                let is_restore = matches!(
                    tokens.get(1),
                    Some(Token::Ident(word)) if word.eq_ignore_ascii_case("restore")
                );
                if is_restore {
                    return Ok(Statement::OrgRestore);
                }
                let mut p = ExprParser::new(&tokens[1..]);
                let expr = p.parse_expr()?;
                return Ok(Statement::Org(expr));
            }
            "bss" => {
                let mut p = ExprParser::new(&tokens[1..]);
                let expr = p.parse_expr()?;
                return Ok(Statement::Bss(expr));
            }
            "db" => {
                return Ok(Statement::Db(parse_data_items(&tokens[1..])?));
            }
            "dw" => {
                return Ok(Statement::Dw(parse_expr_list(&tokens[1..])?));
            }
            _ => {}
        }
    }

    // Instruction: mnemonic followed by comma-separated operands.
    let mnemonic = match &tokens[0] {
        Token::Ident(name) => name.clone(),
        other => return Err(EvalError::InvalidLiteral(format!("{other:?}"))),
    };
    let operand_tokens = &tokens[1..];
    let operands = split_on_commas(operand_tokens)
        .into_iter()
        .map(parse_operand)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Statement::Instruction { mnemonic, operands })
}

fn split_on_commas(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, tok) in tokens.iter().enumerate() {
        if *tok == Token::Comma {
            parts.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    if start < tokens.len() || !tokens.is_empty() {
        parts.push(&tokens[start..]);
    }
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn parse_expr_list(tokens: &[Token]) -> Result<Vec<Expr>, EvalError> {
    split_on_commas(tokens)
        .into_iter()
        .map(|toks| {
            let mut p = ExprParser::new(toks);
            p.parse_expr()
        })
        .collect()
}

fn parse_data_items(tokens: &[Token]) -> Result<Vec<DataItem>, EvalError> {
    split_on_commas(tokens)
        .into_iter()
        .map(|toks| match toks {
            [Token::Str(s)] => Ok(DataItem::Str(s.clone())),
            _ => {
                let mut p = ExprParser::new(toks);
                Ok(DataItem::Byte(p.parse_expr()?))
            }
        })
        .collect()
}

fn as_register(tokens: &[Token]) -> Option<Reg> {
    match tokens {
        [Token::Ident(name)] => Reg::from_name(name),
        _ => None,
    }
}

fn parse_operand(tokens: &[Token]) -> Result<Operand, EvalError> {
    if tokens.first() == Some(&Token::Caret) {
        let inner = strip_brackets(&tokens[1..])?;
        return Ok(parse_indirect(inner, true)?);
    }
    if tokens.first() == Some(&Token::LBracket) {
        let inner = strip_brackets(tokens)?;
        return Ok(parse_indirect(inner, false)?);
    }
    if let Some(reg) = as_register(tokens) {
        return Ok(Operand::Register(reg));
    }
    let mut p = ExprParser::new(tokens);
    Ok(Operand::Value(p.parse_expr()?))
}

fn strip_brackets(tokens: &[Token]) -> Result<&[Token], EvalError> {
    if tokens.first() != Some(&Token::LBracket) || tokens.last() != Some(&Token::RBracket) {
        return Err(EvalError::InvalidLiteral("expected [..]".to_string()));
    }
    Ok(&tokens[1..tokens.len() - 1])
}

fn parse_indirect(inner: &[Token], is_word: bool) -> Result<Operand, EvalError> {
    if let Some(Token::Ident(name)) = inner.first() {
        if let Some(reg) = Reg::from_name(name) {
            if inner.len() == 1 {
                return Ok(if is_word {
                    Operand::IndRegWord(reg)
                } else {
                    Operand::IndReg(reg)
                });
            }
            match inner.get(1) {
                Some(Token::Plus) => {
                    let mut p = ExprParser::new(&inner[2..]);
                    let offset = p.parse_expr()?;
                    return Ok(if is_word {
                        Operand::IndRegOffsetWord(reg, offset)
                    } else {
                        Operand::IndRegOffset(reg, offset)
                    });
                }
                Some(Token::Minus) => {
                    let mut p = ExprParser::new(&inner[2..]);
                    let offset = Expr::Neg(Box::new(p.parse_expr()?));
                    return Ok(if is_word {
                        Operand::IndRegOffsetWord(reg, offset)
                    } else {
                        Operand::IndRegOffset(reg, offset)
                    });
                }
                _ => {}
            }
        }
    }
    let mut p = ExprParser::new(inner);
    let addr = p.parse_expr()?;
    Ok(if is_word {
        Operand::IndWord(addr)
    } else {
        Operand::IndByte(addr)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label() {
        let s = parse_line("loop:").unwrap().unwrap();
        assert_eq!(s, Statement::Label("loop".to_string()));
    }

    #[test]
    fn parses_define() {
        let s = parse_line("xx = 3").unwrap().unwrap();
        assert_eq!(
            s,
            Statement::Define {
                name: "xx".to_string(),
                expr: Expr::Number(3)
            }
        );
    }

    #[test]
    fn dot_define_is_error() {
        let err = parse_line(".abc = 3").unwrap_err();
        assert_eq!(err, EvalError::DefineStartsWithDot(".abc".to_string()));
    }

    #[test]
    fn parses_indirect_reg_offset() {
        let s = parse_line("pushb [B + 12]").unwrap().unwrap();
        assert_eq!(
            s,
            Statement::Instruction {
                mnemonic: "pushb".to_string(),
                operands: vec![Operand::IndRegOffset(Reg::B, Expr::Number(12))],
            }
        );
    }

    #[test]
    fn parses_mov_with_register_and_immediate() {
        let s = parse_line("mov A, 0x12").unwrap().unwrap();
        assert_eq!(
            s,
            Statement::Instruction {
                mnemonic: "mov".to_string(),
                operands: vec![Operand::Register(Reg::A), Operand::Value(Expr::Number(0x12))],
            }
        );
    }

    #[test]
    fn splits_marker() {
        let (file, line, text) = split_marker("[$main.s$:2] xxx").unwrap();
        assert_eq!(file, "main.s");
        assert_eq!(line, 2);
        assert_eq!(text, "xxx");
    }
}
