//! Token-based SQL layout.
//!
//! Output depends only on the token stream, never on the input's
//! whitespace, which makes the formatter idempotent.

use crate::{FilekitError, Result};

const KEYWORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK", "CONSTRAINT",
    "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXCEPT",
    "EXISTS", "FALSE", "FOREIGN", "FROM", "FULL", "GROUP", "HAVING", "IF", "IN", "INDEX",
    "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE", "LIMIT",
    "NATURAL", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES",
    "REPLACE", "RETURNING", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TRUE", "UNION",
    "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

/// Upper-cased like keywords, but written directly against their `(`.
const FUNCTIONS: &[&str] = &[
    "ABS", "AVG", "CAST", "COALESCE", "COUNT", "IFNULL", "LENGTH", "LOWER", "MAX", "MIN", "NOW",
    "NULLIF", "ROUND", "SUBSTRING", "SUM", "UPPER",
];

/// Keywords that start a new unindented line.
const CLAUSES: &[&str] = &[
    "DELETE", "EXCEPT", "FROM", "HAVING", "INSERT", "INTERSECT", "LIMIT", "OFFSET", "RETURNING",
    "SELECT", "SET", "UNION", "UPDATE", "VALUES", "WHERE", "WITH",
];

const JOIN_MODIFIERS: &[&str] = &["CROSS", "FULL", "INNER", "LEFT", "NATURAL", "OUTER", "RIGHT"];

const TWO_CHAR_OPERATORS: &[&str] = &["<=", ">=", "<>", "!=", "||", "::"];

const ITEM_INDENT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Number(String),
    Quoted(String),
    Operator(String),
    Comma,
    Open,
    Close,
    Semicolon,
    Dot,
    LineComment(String),
    BlockComment(String),
}

impl Token {
    fn word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            _ => None,
        }
    }

    fn is_keyword(&self) -> bool {
        self.word().is_some_and(|w| KEYWORDS.contains(&w))
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let take_while = |start: usize, pred: &dyn Fn(char) -> bool| {
        let mut end = start;
        while end < chars.len() && pred(chars[end]) {
            end += 1;
        }
        end
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
        } else if c == '-' && next == Some('-') {
            let end = take_while(i, &|ch| ch != '\n');
            let comment: String = chars[i..end].iter().collect();
            tokens.push(Token::LineComment(comment.trim_end().to_string()));
            i = end;
        } else if c == '/' && next == Some('*') {
            let close = (i + 2..chars.len().saturating_sub(1))
                .find(|&j| chars[j] == '*' && chars[j + 1] == '/')
                .ok_or_else(|| FilekitError::invalid("invalid SQL: unterminated comment"))?;
            tokens.push(Token::BlockComment(chars[i..close + 2].iter().collect()));
            i = close + 2;
        } else if matches!(c, '\'' | '"' | '`') {
            let end = quoted_end(&chars, i)?;
            tokens.push(Token::Quoted(chars[i..end].iter().collect()));
            i = end;
        } else if c.is_ascii_digit() {
            let end = take_while(i, &|ch| ch.is_ascii_alphanumeric() || ch == '.');
            tokens.push(Token::Number(chars[i..end].iter().collect()));
            i = end;
        } else if c.is_alphabetic() || matches!(c, '_' | '@' | '$' | '#') {
            let end = take_while(i, &|ch| ch.is_alphanumeric() || matches!(ch, '_' | '$' | '@' | '#'));
            let word: String = chars[i..end].iter().collect();
            tokens.push(Token::Word(normalize_word(word)));
            i = end;
        } else {
            let token = match c {
                ',' => Token::Comma,
                '(' => Token::Open,
                ')' => Token::Close,
                ';' => Token::Semicolon,
                '.' => Token::Dot,
                _ => {
                    let pair: String = chars[i..(i + 2).min(chars.len())].iter().collect();
                    if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                        i += 1;
                        Token::Operator(pair)
                    } else {
                        Token::Operator(c.to_string())
                    }
                }
            };
            tokens.push(token);
            i += 1;
        }
    }

    Ok(tokens)
}

/// Index just past the closing quote of the literal opening at `start`.
/// A doubled quote character is an escaped quote.
fn quoted_end(chars: &[char], start: usize) -> Result<usize> {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Ok(i + 1);
        }
        i += 1;
    }
    Err(FilekitError::invalid("invalid SQL: unterminated string literal"))
}

fn normalize_word(word: String) -> String {
    let upper = word.to_ascii_uppercase();
    if KEYWORDS.contains(&upper.as_str()) || FUNCTIONS.contains(&upper.as_str()) {
        upper
    } else {
        word
    }
}

#[derive(Default)]
struct Layout {
    out: String,
    glue_next: bool,
}

impl Layout {
    fn at_line_start(&self) -> bool {
        let trimmed = self.out.trim_end_matches(' ');
        trimmed.is_empty() || trimmed.ends_with('\n')
    }

    fn newline(&mut self, indent: usize) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.extend(std::iter::repeat(' ').take(indent));
        self.glue_next = false;
    }

    fn push(&mut self, text: &str, space_before: bool) {
        if space_before && !self.glue_next && !self.at_line_start() {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.glue_next = false;
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

/// Upper-case keywords and break clauses onto their own lines.
pub fn format_sql(text: &str) -> Result<String> {
    let tokens = tokenize(text)?;
    let mut layout = Layout::default();
    let mut depth = 0usize;
    let mut clause: Option<&str> = None;
    let mut between_pending = false;

    for (i, token) in tokens.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| &tokens[p]);
        let next_word = tokens.get(i + 1).and_then(Token::word);
        let prev_word = prev.and_then(Token::word);

        match token {
            Token::Word(word) => {
                let w = word.as_str();
                if depth == 0 {
                    let breaks = match w {
                        "FROM" => prev_word != Some("DELETE"),
                        "GROUP" | "ORDER" => next_word == Some("BY"),
                        "JOIN" => !prev_word.is_some_and(|p| JOIN_MODIFIERS.contains(&p)),
                        "INNER" | "CROSS" | "NATURAL" => next_word == Some("JOIN"),
                        "LEFT" | "RIGHT" | "FULL" => {
                            matches!(next_word, Some("JOIN") | Some("OUTER"))
                        }
                        _ => CLAUSES.contains(&w),
                    };
                    if breaks {
                        layout.newline(0);
                        clause = Some(clause_name(w));
                    } else if matches!(w, "AND" | "OR") {
                        if w == "AND" && between_pending {
                            between_pending = false;
                        } else {
                            layout.newline(ITEM_INDENT);
                        }
                    }
                }
                if w == "BETWEEN" {
                    between_pending = true;
                }
                layout.push(w, !matches!(prev, Some(Token::Open | Token::Dot)));
            }
            Token::Number(text) | Token::Quoted(text) => {
                layout.push(text, !matches!(prev, Some(Token::Open | Token::Dot)));
            }
            Token::BlockComment(text) => layout.push(text, true),
            Token::LineComment(text) => {
                layout.push(text, true);
                layout.newline(0);
            }
            Token::Operator(op) => {
                let unary = matches!(op.as_str(), "-" | "+")
                    && match prev {
                        None => true,
                        Some(Token::Operator(_) | Token::Open | Token::Comma) => true,
                        Some(t) => t.is_keyword(),
                    }
                    && matches!(
                        tokens.get(i + 1),
                        Some(Token::Number(_) | Token::Word(_) | Token::Quoted(_) | Token::Open)
                    );
                layout.push(op, !matches!(prev, Some(Token::Open | Token::Dot)));
                layout.glue_next = unary;
            }
            Token::Comma => {
                layout.push(",", false);
                if depth == 0 && clause == Some("SELECT") {
                    layout.newline(ITEM_INDENT);
                }
            }
            Token::Open => {
                let space = match prev {
                    Some(Token::Word(w)) => KEYWORDS.contains(&w.as_str()),
                    Some(Token::Open | Token::Dot) | None => false,
                    Some(_) => true,
                };
                layout.push("(", space);
                depth += 1;
            }
            Token::Close => {
                layout.push(")", false);
                depth = depth.saturating_sub(1);
            }
            Token::Dot => layout.push(".", false),
            Token::Semicolon => {
                layout.push(";", false);
                layout.out.push_str("\n\n");
                depth = 0;
                clause = None;
                between_pending = false;
            }
        }
    }

    Ok(layout.finish())
}

fn clause_name(word: &str) -> &'static str {
    match word {
        "SELECT" => "SELECT",
        "FROM" => "FROM",
        "WHERE" => "WHERE",
        "GROUP" => "GROUP BY",
        "ORDER" => "ORDER BY",
        "SET" => "SET",
        "VALUES" => "VALUES",
        _ => "OTHER",
    }
}
