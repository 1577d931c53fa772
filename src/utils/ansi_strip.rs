use unicode_width::UnicodeWidthChar;

/// Strip a string until it only takes up to N columns in the terminal
/// Currently uses an inefficient bruteforce algorithm
pub fn ansi_strip(input: &str, max_width: usize) -> &str {
    let mut len = 0;
    let mut cols = 0;

    let mut in_escape_seq = false;

    for char in input.chars() {
        len += char.len_utf8();

        if u64::from(char) == 0x1B {
            in_escape_seq = true;
            continue;
        }

        if in_escape_seq {
            if char == 'm' {
                in_escape_seq = false;
            }

            continue;
        }

        let char_cols = char.width().unwrap_or(0);

        if cols + char_cols > max_width {
            len -= char.len_utf8();
            break;
        }

        cols += char_cols;
    }

    // Unterminated escape sequence: drop it entirely
    if in_escape_seq {
        return input
            .rfind('\x1B')
            .map_or(input, |start| &input[..start]);
    }

    &input[..len]
}

/// Remove all color escape sequences, for outputs that aren't a terminal
pub fn strip_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_escape_seq = false;

    for char in input.chars() {
        if char == '\x1B' {
            in_escape_seq = true;
            continue;
        }

        if in_escape_seq {
            if char == 'm' {
                in_escape_seq = false;
            }

            continue;
        }

        out.push(char);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_terminal_width_ignoring_escapes() {
        let colored = "\x1B[94mhello world\x1B[0m";

        assert_eq!(ansi_strip(colored, 5), "\x1B[94mhello");
        assert_eq!(ansi_strip("hello", 10), "hello");
    }

    #[test]
    fn strips_color_escapes() {
        assert_eq!(
            strip_escapes("\x1B[93m'album'\x1B[0m uploaded"),
            "'album' uploaded"
        );
        assert_eq!(strip_escapes("plain"), "plain");
    }
}
