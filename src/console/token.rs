/// Splits the first space-delimited token off `rest`.
///
/// `rest` is advanced past the separating space. Without a space the whole
/// input is the token and `rest` becomes empty.
pub fn get_token<'a>(rest: &mut &'a str) -> &'a str {
    match rest.split_once(' ') {
        Some((token, tail)) => {
            *rest = tail;
            token
        }
        None => {
            let token = *rest;
            *rest = &rest[rest.len()..];
            token
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_command_and_argument() {
        let mut rest = "phase 123";
        assert_eq!(get_token(&mut rest), "phase");
        assert_eq!(rest, "123");
    }

    #[test]
    fn single_word_leaves_rest_empty() {
        let mut rest = "help";
        assert_eq!(get_token(&mut rest), "help");
        assert_eq!(rest, "");
        assert_eq!(get_token(&mut rest), "");
    }

    #[test]
    fn only_the_first_space_is_consumed() {
        let mut rest = "ub_send  0xA0000000 8192";
        assert_eq!(get_token(&mut rest), "ub_send");
        assert_eq!(rest, " 0xA0000000 8192");
        assert_eq!(get_token(&mut rest), "");
        assert_eq!(get_token(&mut rest), "0xA0000000");
        assert_eq!(rest, "8192");
    }
}
