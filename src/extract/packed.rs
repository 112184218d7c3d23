//! Packed-JS unpacker
//!
//! Player pages on several embed hosts ship their real script through the
//! classic `eval(function(p,a,c,k,e,d){...})` packer: a payload string whose
//! base-N word tokens index into a `|`-joined dictionary. The eval call is
//! located by scanning balanced parentheses from a literal marker rather
//! than by regex, because the payload routinely contains quotes and braces
//! that defeat a lazy match. Substitution runs from the highest token index
//! down to zero; running upward lets an early replacement manufacture text
//! that a later token then corrupts.

use regex::Regex;

const EVAL_MARKERS: [&str; 2] = [
    "eval(function(p,a,c,k,e,d)",
    "eval(function(p,a,c,k,e,r)",
];

const PAYLOAD_CLOSE: &str = "return p}(";

/// Locate the full packed eval call in a page, if present
pub fn find_eval_block(html: &str) -> Option<&str> {
    let start = EVAL_MARKERS.iter().find_map(|marker| html.find(marker))?;
    let bytes = html.as_bytes();
    let mut depth: i32 = 0;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Unpack a located eval block into the clear-text script.
///
/// Pulls the four packer arguments `(payload, radix, count, dictionary)`
/// apart: the payload is the first single-quoted literal after the
/// `return p}(` body close (honoring `\'` escapes), and the numeric tail
/// plus dictionary follow it in fixed form.
pub fn unpack(packed: &str) -> Option<String> {
    let body_end = packed.find(PAYLOAD_CLOSE)?;
    let args = &packed[body_end + PAYLOAD_CLOSE.len()..];

    let (payload, rest) = take_quoted_payload(args)?;

    let tail_re =
        Regex::new(r"^\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*'([^']*)'\s*\.split\(\s*'([^']*)'\s*\)")
            .ok()?;
    let captures = tail_re.captures(rest)?;
    let radix: u32 = captures[1].parse().ok()?;
    let count: usize = captures[2].parse().ok()?;
    let dict_text = captures.get(3).map_or("", |m| m.as_str());
    let separator = captures.get(4).map_or("", |m| m.as_str());
    let dictionary: Vec<&str> = if separator.is_empty() {
        vec![dict_text]
    } else {
        dict_text.split(separator).collect()
    };

    substitute_tokens(payload, radix, count, &dictionary)
}

/// Scan for the first 'single-quoted' literal, respecting backslash escapes.
/// Returns the literal body and the remainder after the closing quote.
fn take_quoted_payload(args: &str) -> Option<(&str, &str)> {
    let bytes = args.as_bytes();
    let mut start = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' && (i == 0 || bytes[i - 1] != b'\\') {
            match start {
                None => start = Some(i + 1),
                Some(s) => return Some((&args[s..i], &args[i + 1..])),
            }
        }
        i += 1;
    }
    None
}

/// Replace whole-word base-`radix` tokens with their dictionary entries,
/// iterating from `count - 1` down to `0`. Empty dictionary entries leave
/// the numeric token in place.
pub fn substitute_tokens(
    payload: &str,
    radix: u32,
    count: usize,
    dictionary: &[&str],
) -> Option<String> {
    if !(2..=62).contains(&radix) {
        return None;
    }
    let mut result = payload.to_string();
    for index in (0..count).rev() {
        let entry = dictionary.get(index).copied().unwrap_or("");
        if entry.is_empty() {
            continue;
        }
        let token = base_n(index, radix);
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&token))).ok()?;
        result = pattern.replace_all(&result, entry).into_owned();
    }
    Some(result)
}

/// Render an index in the packer's base-N alphabet (digits, lowercase,
/// then uppercase, radix up to 62)
pub fn base_n(index: usize, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let radix = radix as usize;
    if index == 0 {
        return "0".to_string();
    }
    let mut num = index;
    let mut out = Vec::new();
    while num > 0 {
        out.push(DIGITS[num % radix]);
        num /= radix;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKED_PAGE: &str = r#"<html><script>
eval(function(p,a,c,k,e,d){e=function(c){return c.toString(36)};if(!''.replace(/^/,String)){while(c--){d[c.toString(a)]=k[c]||c.toString(a)}k=[function(e){return d[e]}];e=function(){return'\\w+'};c=1};while(c--){if(k[c]){p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c])}}return p}('4 0={1:\'2://3.5/6.7\'};',36,8,'sources|hls|https|cdn|var|example|master|m3u8'.split('|'),0,{}))
</script></html>"#;

    #[test]
    fn test_find_eval_block_by_balanced_parens() {
        let block = find_eval_block(PACKED_PAGE).expect("eval block expected");
        assert!(block.starts_with("eval(function(p,a,c,k,e,d)"));
        assert!(block.ends_with("))"));
        assert!(block.contains("'.split('|')"));
    }

    #[test]
    fn test_find_eval_block_variant_marker() {
        let page = PACKED_PAGE.replace("p,a,c,k,e,d", "p,a,c,k,e,r");
        let block = find_eval_block(&page).expect("variant block expected");
        assert!(block.starts_with("eval(function(p,a,c,k,e,r)"));
    }

    #[test]
    fn test_unpack_produces_clear_script() {
        let block = find_eval_block(PACKED_PAGE).unwrap();
        let unpacked = unpack(block).expect("unpack expected");
        assert_eq!(unpacked, r"var sources={hls:\'https://cdn.example/master.m3u8\'};");
    }

    #[test]
    fn test_unpack_rejects_truncated_block() {
        assert_eq!(unpack("eval(function(p,a,c,k,e,d){}"), None);
        assert_eq!(unpack("return p}('abc'"), None);
    }

    #[test]
    fn test_substitution_order_is_high_to_low() {
        // Token "10" (index 36, radix 36) maps to the text "1"; token "1"
        // (index 1) maps to "fn". Processed downward the manufactured "1"
        // is still rewritten; upward it survives as a stray "1".
        let mut dictionary = vec![""; 37];
        dictionary[1] = "fn";
        dictionary[36] = "1";

        let correct = substitute_tokens("10 1", 36, 37, &dictionary).unwrap();
        assert_eq!(correct, "fn fn");

        let mut reversed = "10 1".to_string();
        for index in 0..37 {
            let entry = dictionary[index];
            if entry.is_empty() {
                continue;
            }
            let token = base_n(index, 36);
            let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&token))).unwrap();
            reversed = pattern.replace_all(&reversed, entry).into_owned();
        }
        assert_eq!(reversed, "1 fn");
        assert_ne!(correct, reversed);
    }

    #[test]
    fn test_empty_dictionary_entries_keep_tokens() {
        let dictionary = vec!["alpha", "", "gamma"];
        let result = substitute_tokens("0 1 2", 36, 3, &dictionary).unwrap();
        assert_eq!(result, "alpha 1 gamma");
    }

    #[test]
    fn test_word_boundaries_protect_longer_tokens() {
        // "1" must not be replaced inside "10" or "a1"
        let dictionary = vec!["", "x"];
        let result = substitute_tokens("1 10 a1", 36, 2, &dictionary).unwrap();
        assert_eq!(result, "x 10 a1");
    }

    #[test]
    fn test_base_n_alphabet() {
        assert_eq!(base_n(0, 36), "0");
        assert_eq!(base_n(10, 36), "a");
        assert_eq!(base_n(35, 36), "z");
        assert_eq!(base_n(36, 36), "10");
        assert_eq!(base_n(61, 62), "Z");
        assert_eq!(base_n(62, 62), "10");
    }

    #[test]
    fn test_payload_with_escaped_quotes() {
        let packed = r"eval(function(p,a,c,k,e,d){return p}('0=\'1\'',36,2,'a|b'.split('|'),0,{}))";
        let unpacked = unpack(packed).unwrap();
        assert_eq!(unpacked, r"a=\'b\'");
    }
}
