//! Shell-quoting of command lines, for showing the exact simulator
//! invocation in logs so that it can be copy-pasted and rerun.

use std::borrow::Cow;

use itertools::Itertools;

const CHARS_NOT_NEEDING_QUOTING: &str = "_:.-+,/=@[]^";

pub fn bash_string_literal(s: &str) -> Cow<'_, str> {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || CHARS_NOT_NEEDING_QUOTING.contains(c))
    {
        s.into()
    } else {
        let mut ss = String::with_capacity(s.len() + 2);
        ss.push('\'');
        for c in s.chars() {
            if c == '\'' {
                ss.push_str("'\\''");
            } else {
                ss.push(c);
            }
        }
        ss.push('\'');
        ss.into()
    }
}

pub fn bash_string_from_cmd(cmd: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    cmd.into_iter()
        .map(|s| bash_string_literal(s.as_ref()).into_owned())
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_bash_string_literal() {
        assert_eq!(bash_string_literal("--height=100"), "--height=100");
        assert_eq!(
            bash_string_literal("--socket_factory=ns3::UdpSocketFactory"),
            "--socket_factory=ns3::UdpSocketFactory"
        );
        assert_eq!(bash_string_literal("a b"), "'a b'");
        assert_eq!(bash_string_literal("it's"), "'it'\\''s'");
        assert_eq!(bash_string_literal(""), "''");
    }

    #[test]
    fn t_bash_string_from_cmd() {
        assert_eq!(
            bash_string_from_cmd(["./simulation3", "--distance=3", "--olsr"]),
            "./simulation3 --distance=3 --olsr"
        );
    }
}
