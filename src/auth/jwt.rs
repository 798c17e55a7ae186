use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Bearer token claims, as minted by the auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

/// Decodes an access token; refresh tokens are refused.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("access token required".to_string());
    }

    Ok(claims)
}


#[cfg(test)]
mod tests {
    use super::testing::mint_token;
    use super::*;

    #[test]
    fn access_tokens_verify() {
        let token = mint_token(3, Some(1000), TokenType::Access, "secret");
        let claims = verify_access_token(&token, "secret").unwrap();

        assert_eq!(claims.employee_id, Some(1000));
        assert_eq!(claims.role, 3);
    }

    #[test]
    fn refresh_tokens_and_wrong_secrets_are_refused() {
        let refresh = mint_token(3, Some(1000), TokenType::Refresh, "secret");
        assert!(verify_access_token(&refresh, "secret").is_err());

        let access = mint_token(3, Some(1000), TokenType::Access, "secret");
        assert!(verify_access_token(&access, "other").is_err());
    }
}
