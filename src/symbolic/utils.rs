//! String helpers for the expression parser: bracket matching and operator search
//! outside of brackets. Inputs are ASCII (checked by the parser), so byte offsets
//! and character offsets coincide.

/// true when every ')' closes an earlier '(' and nothing is left open
pub fn brackets_balanced(input: &str) -> bool {
    let mut depth: i64 = 0;
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// position of the ')' closing the '(' found at `bracket_start`
pub fn find_pair_to_this_bracket(input: &str, bracket_start: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(bracket_start) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(bracket_start) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// `(...)` where the first bracket is closed by the very last character
pub fn is_wrapped_in_brackets(input: &str) -> bool {
    input.starts_with('(') && find_pair_to_this_bracket(input, 0) == Some(input.len() - 1)
}

/// Finds the rightmost binary operator from `ops` at bracket depth zero.
///
/// A '+' or '-' counts as binary only when the previous non-space character is an
/// operand (letter, digit, '.' or ')'). The sign of a float exponent (`1e-3`) is skipped.
pub fn find_rightmost_operator_outside_brackets(input: &str, ops: &[char]) -> Option<(usize, char)> {
    let bytes = input.as_bytes();
    let mut depth: i64 = 0;
    for i in (0..bytes.len()).rev() {
        let c = bytes[i] as char;
        match c {
            ')' => depth += 1,
            '(' => depth -= 1,
            _ if depth == 0 && ops.contains(&c) => {
                if c == '+' || c == '-' {
                    if is_binary_sign(bytes, i) {
                        return Some((i, c));
                    }
                } else {
                    return Some((i, c));
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds the leftmost occurrence of `target` at bracket depth zero.
pub fn find_char_positions_outside_brackets(input: &str, target: char) -> Option<usize> {
    let mut depth: i64 = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 && c == target => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_binary_sign(bytes: &[u8], pos: usize) -> bool {
    let prev = bytes[..pos].iter().rposition(|b| !b.is_ascii_whitespace());
    let Some(prev) = prev else {
        return false;
    };
    let p = bytes[prev] as char;
    if !(p.is_ascii_alphanumeric() || p == '.' || p == ')' || p == '_') {
        return false;
    }
    // 2.5e-3: the sign belongs to the number literal
    if (p == 'e' || p == 'E') && prev == pos - 1 {
        let mantissa_start = bytes[..prev]
            .iter()
            .rposition(|b| !(b.is_ascii_digit() || *b == b'.'))
            .map_or(0, |i| i + 1);
        let mantissa = &bytes[mantissa_start..prev];
        let starts_token = mantissa_start == 0 || !(bytes[mantissa_start - 1] as char).is_ascii_alphanumeric();
        if !mantissa.is_empty() && mantissa[0].is_ascii_digit() && starts_token {
            return false;
        }
    }
    true
}

/// Valid variable name: starts with a letter or '_', then letters, digits or '_'.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brackets() {
        assert!(brackets_balanced("(x+1)*(x-2)"));
        assert!(!brackets_balanced("(x+1))("));
        assert_eq!(find_pair_to_this_bracket("(x+(1))*2", 0), Some(6));
        assert!(is_wrapped_in_brackets("(x+(1))"));
        assert!(!is_wrapped_in_brackets("(x+1)*(2)"));
    }

    #[test]
    fn test_rightmost_operator() {
        assert_eq!(
            find_rightmost_operator_outside_brackets("x-(y+z)+1", &['+', '-']),
            Some((7, '+'))
        );
        // unary minus after '*' is not a binary operator
        assert_eq!(find_rightmost_operator_outside_brackets("2*-x", &['+', '-']), None);
        assert_eq!(find_rightmost_operator_outside_brackets("-x", &['+', '-']), None);
        // float exponent
        assert_eq!(
            find_rightmost_operator_outside_brackets("1e-3*x", &['+', '-']),
            None
        );
        assert_eq!(
            find_rightmost_operator_outside_brackets("e-3", &['+', '-']),
            Some((1, '-'))
        );
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("x"));
        assert!(is_identifier("t_1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("x y"));
    }
}
