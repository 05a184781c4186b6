use rand::Rng;

/// 票号字符集：去掉易混淆的 0/O/1/I
const TICKET_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// 生成票号，格式 `XXXX-XXXX`
pub fn generate_ticket_code() -> String {
    let mut rng = rand::thread_rng();
    let mut pick = || TICKET_ALPHABET[rng.gen_range(0..TICKET_ALPHABET.len())] as char;
    let head: String = (0..4).map(|_| pick()).collect();
    let tail: String = (0..4).map(|_| pick()).collect();
    format!("{head}-{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ticket_code() {
        let code = generate_ticket_code();
        assert_eq!(code.len(), 9);
        assert_eq!(&code[4..5], "-");
        assert!(
            code.chars()
                .filter(|c| *c != '-')
                .all(|c| TICKET_ALPHABET.contains(&(c as u8)))
        );
    }

    #[test]
    fn test_generate_multiple_codes() {
        // 理论上可能重复，这里只确认格式稳定
        let a = generate_ticket_code();
        let b = generate_ticket_code();
        assert_eq!(a.len(), b.len());
    }
}
