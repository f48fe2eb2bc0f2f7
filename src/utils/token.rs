use rand::Rng;
use rand::distributions::Alphanumeric;

const CONFIRMATION_TOKEN_LEN: usize = 48;

/// 生成邮箱确认令牌
pub fn generate_confirmation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONFIRMATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_confirmation_token() {
        let token = generate_confirmation_token();
        assert_eq!(token.len(), CONFIRMATION_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_confirmation_token());
    }
}
