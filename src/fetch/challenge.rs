//! Interstitial cookie-challenge interpreter
//!
//! Some scraped sites sit behind an interstitial page whose inline script
//! assembles a session cookie from string fragments, sets `document.cookie`,
//! and reloads. Rather than embedding a script engine, this module interprets
//! exactly that known shape: `var` assignments built from string literals,
//! `String.fromCharCode(...)` calls, and references to previously assigned
//! variables, feeding a `document.cookie` assignment. Anything outside that
//! grammar makes the challenge unsolvable and the original page body is used
//! as-is rather than interpreted further.

use std::collections::HashMap;

/// Interstitial pages are small; anything bigger is a real content page
const MAX_CHALLENGE_BODY: usize = 8 * 1024;

/// Hard ceilings so a hostile script cannot spin the interpreter
const MAX_STATEMENTS: usize = 256;
const MAX_VALUE_LEN: usize = 16 * 1024;

/// Check for the known interstitial marker: a tiny page whose script sets a
/// cookie and reloads itself.
pub fn looks_like_challenge(body: &str) -> bool {
    body.len() < MAX_CHALLENGE_BODY
        && body.contains("document.cookie")
        && (body.contains("location.reload") || body.contains("location.href"))
}

/// Pull the inline script containing the cookie assignment out of the page
pub fn extract_script(body: &str) -> Option<String> {
    let mut rest = body;
    while let Some(open) = rest.find("<script") {
        let after_tag = &rest[open..];
        let content_start = after_tag.find('>')? + 1;
        let content = &after_tag[content_start..];
        let close = content.find("</script")?;
        let script = &content[..close];
        if script.contains("document.cookie") {
            return Some(script.to_string());
        }
        rest = &content[close..];
    }
    None
}

/// Interpret the challenge script and return the derived `name=value` cookie
/// pair, stripped of trailing attributes like `path=/`.
pub fn derive_cookie(script: &str) -> Option<String> {
    let mut vars: HashMap<String, String> = HashMap::new();
    let mut cookie = String::new();

    for statement in split_statements(script).into_iter().take(MAX_STATEMENTS) {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        if let Some((target, append, expr)) = parse_assignment(statement) {
            if target == "document.cookie" {
                // The cookie expression itself must evaluate or the
                // challenge is unsolvable.
                let value = eval_expr(expr, &vars)?;
                if append {
                    cookie.push_str(&value);
                } else {
                    cookie = value;
                }
                if cookie.len() > MAX_VALUE_LEN {
                    return None;
                }
            } else if let Some(value) = eval_expr(expr, &vars) {
                let entry = vars.entry(target.to_string()).or_default();
                if append {
                    entry.push_str(&value);
                } else {
                    *entry = value;
                }
                if entry.len() > MAX_VALUE_LEN {
                    return None;
                }
            }
        }
        // Statements outside the grammar (reload calls, date probes,
        // unevaluable helper assignments) are ignored.
    }

    let pair = cookie.split(';').next()?.trim();
    if pair.contains('=') && !pair.starts_with('=') {
        Some(pair.to_string())
    } else {
        None
    }
}

/// Split on `;` at top level, honoring string literals and parentheses
fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth: i32 = 0;

    for ch in script.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ';' if depth == 0 => {
                statements.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }
    statements
}

/// Recognize `var NAME = expr`, `NAME = expr`, `NAME += expr`, and the
/// `document.cookie` forms. Returns (target, is-append, expression).
fn parse_assignment(statement: &str) -> Option<(&str, bool, &str)> {
    let statement = statement.trim().strip_prefix("var ").unwrap_or(statement.trim());

    let eq = find_top_level_eq(statement)?;
    let (lhs, rhs) = statement.split_at(eq);
    let append = lhs.ends_with('+');
    let target = lhs.trim_end_matches('+').trim();
    let expr = rhs[1..].trim();

    let valid_target = target == "document.cookie"
        || (!target.is_empty()
            && target
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'));
    if valid_target {
        Some((target, append, expr))
    } else {
        None
    }
}

/// Find the assignment `=`, skipping `==` comparisons and quoted content
fn find_top_level_eq(statement: &str) -> Option<usize> {
    let bytes = statement.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'=' => {
                let next = bytes.get(i + 1);
                let prev = i.checked_sub(1).and_then(|p| bytes.get(p));
                if next != Some(&b'=') && prev != Some(&b'=') && prev != Some(&b'!') {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Evaluate a `+`-joined expression of literals, fromCharCode calls, and
/// variable references
fn eval_expr(expr: &str, vars: &HashMap<String, String>) -> Option<String> {
    let mut result = String::new();
    for term in split_terms(expr) {
        let term = term.trim();
        // Parenthesized single terms appear in some variants: ('abc')
        let term = term
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .map(str::trim)
            .unwrap_or(term);

        let value = if let Some(literal) = parse_string_literal(term) {
            literal
        } else if let Some(rest) = term.strip_prefix("String.fromCharCode") {
            let args = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
            let mut s = String::new();
            for code in args.split(',') {
                let code: u32 = code.trim().parse().ok()?;
                s.push(char::from_u32(code)?);
            }
            s
        } else if term
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            && !term.is_empty()
        {
            vars.get(term)?.clone()
        } else {
            return None;
        };

        result.push_str(&value);
        if result.len() > MAX_VALUE_LEN {
            return None;
        }
    }
    Some(result)
}

/// Split an expression on `+` at top level
fn split_terms(expr: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth: i32 = 0;

    for ch in expr.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            '+' if depth == 0 => {
                terms.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        terms.push(current);
    }
    terms
}

/// Decode a quoted JS string literal with backslash escapes
fn parse_string_literal(term: &str) -> Option<String> {
    let mut chars = term.chars();
    let quote = chars.next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let mut result = String::new();
    let mut escaped = false;
    for ch in chars {
        if escaped {
            match ch {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                other => result.push(other),
            }
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return Some(result);
        } else {
            result.push(ch);
        }
    }
    // Unterminated literal
    None
}
