/// First `max` bytes of `s` (cut on a char boundary), with an ellipsis when shortened.
pub fn preview(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let end = s
        .char_indices()
        .take_while(|(i, _)| *i < max)
        .last()
        .map(|(i, c)| {
            let next = i + c.len_utf8();
            if next > max {
                i
            } else {
                next
            }
        })
        .unwrap_or(0);
    let mut out = s[..end].to_string();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(preview("abc", 10), "abc");
    }

    #[test]
    fn cuts_on_char_boundary() {
        assert_eq!(preview("abcdef", 3), "abc…");
        assert_eq!(preview("日本語テキスト", 7), "日本…");
    }
}
