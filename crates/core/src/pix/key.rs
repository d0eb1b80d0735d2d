//! PIX keys (chaves).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PaymentError;

/// Longest e-mail key the bank accepts.
pub const MAX_EMAIL_LEN: usize = 77;

/// Kind of PIX key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PixKeyType {
    /// Individual taxpayer number, 11 digits.
    Cpf,
    /// Company taxpayer number, 14 digits.
    Cnpj,
    /// E-mail address.
    Email,
    /// Brazilian mobile number.
    Telefone,
    /// Random key (UUID).
    Aleatoria,
}

impl PixKeyType {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cpf => "CPF",
            Self::Cnpj => "CNPJ",
            Self::Email => "EMAIL",
            Self::Telefone => "TELEFONE",
            Self::Aleatoria => "ALEATORIA",
        }
    }

    /// Parses a key type, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CPF" => Some(Self::Cpf),
            "CNPJ" => Some(Self::Cnpj),
            "EMAIL" => Some(Self::Email),
            "TELEFONE" | "PHONE" => Some(Self::Telefone),
            "ALEATORIA" | "EVP" => Some(Self::Aleatoria),
            _ => None,
        }
    }
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, normalized PIX key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixKey {
    /// Key type.
    pub key_type: PixKeyType,
    /// Normalized value: bare digits for CPF/CNPJ, lower-case e-mail,
    /// `+55` phone, hyphenated lower-case UUID.
    pub value: String,
}

impl PixKey {
    /// Validates `raw` as a key of `key_type` and normalizes it.
    pub fn parse(key_type: PixKeyType, raw: &str) -> Result<Self, PaymentError> {
        let invalid = |reason| PaymentError::InvalidPixKey { key_type, reason };
        let raw = raw.trim();

        let value = match key_type {
            PixKeyType::Cpf => {
                let digits = document_digits(raw).ok_or_else(|| invalid("unexpected characters"))?;
                if digits.len() != 11 {
                    return Err(invalid("CPF must have 11 digits"));
                }
                if !check_digits_ok(&digits, &CPF_WEIGHTS) {
                    return Err(invalid("check digits do not match"));
                }
                digits_to_string(&digits)
            }
            PixKeyType::Cnpj => {
                let digits = document_digits(raw).ok_or_else(|| invalid("unexpected characters"))?;
                if digits.len() != 14 {
                    return Err(invalid("CNPJ must have 14 digits"));
                }
                if !check_digits_ok(&digits, &CNPJ_WEIGHTS) {
                    return Err(invalid("check digits do not match"));
                }
                digits_to_string(&digits)
            }
            PixKeyType::Email => {
                let email = raw.to_lowercase();
                if email.len() > MAX_EMAIL_LEN {
                    return Err(invalid("e-mail too long"));
                }
                if !looks_like_email(&email) {
                    return Err(invalid("not an e-mail address"));
                }
                email
            }
            PixKeyType::Telefone => normalize_phone(raw)
                .ok_or_else(|| invalid("expected +55 and 10 or 11 digits"))?,
            PixKeyType::Aleatoria => Uuid::parse_str(raw)
                .map_err(|_| invalid("expected a UUID"))?
                .hyphenated()
                .to_string(),
        };

        Ok(Self { key_type, value })
    }
}

impl fmt::Display for PixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key_type, self.value)
    }
}

const CPF_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Digits of a CPF/CNPJ, ignoring the usual `.`, `-`, `/` and spaces.
fn document_digits(raw: &str) -> Option<Vec<u32>> {
    raw.chars()
        .filter(|c| !matches!(c, '.' | '-' | '/' | ' '))
        .map(|c| c.to_digit(10))
        .collect()
}

fn digits_to_string(digits: &[u32]) -> String {
    digits
        .iter()
        .filter_map(|d| char::from_digit(*d, 10))
        .collect()
}

/// Mod-11 check of the last two digits. `weights` covers the second digit;
/// the first uses the same list without its leading weight.
fn check_digits_ok(digits: &[u32], weights: &[u32]) -> bool {
    if digits.windows(2).all(|w| w[0] == w[1]) {
        return false;
    }
    let n = digits.len();
    let dv = |body: &[u32], weights: &[u32]| {
        let sum: u32 = body.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            0 | 1 => 0,
            r => 11 - r,
        }
    };
    dv(&digits[..n - 2], &weights[1..]) == digits[n - 2]
        && dv(&digits[..n - 1], weights) == digits[n - 1]
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// `+55` followed by area code and number (10 or 11 digits).
fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')' | '-'))
        .collect();
    let (had_plus, digits) = match cleaned.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let national = match digits.strip_prefix("55") {
        Some(rest) if had_plus || matches!(digits.len(), 12 | 13) => rest,
        _ if had_plus => return None,
        _ => digits,
    };
    matches!(national.len(), 10 | 11).then(|| format!("+55{national}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PixKeyType::Cpf, "529.982.247-25", "52998224725")]
    #[case(PixKeyType::Cnpj, "11.222.333/0001-81", "11222333000181")]
    #[case(PixKeyType::Email, " Joao.Silva@Fazenda.com.br ", "joao.silva@fazenda.com.br")]
    #[case(PixKeyType::Telefone, "+55 (62) 99876-5432", "+5562998765432")]
    #[case(PixKeyType::Telefone, "62 3333-4444", "+556233334444")]
    #[case(PixKeyType::Telefone, "5562998765432", "+5562998765432")]
    #[case(
        PixKeyType::Aleatoria,
        "123E4567E89B12D3A456426614174000",
        "123e4567-e89b-12d3-a456-426614174000"
    )]
    fn test_valid_keys(#[case] key_type: PixKeyType, #[case] raw: &str, #[case] expected: &str) {
        let key = PixKey::parse(key_type, raw).unwrap();
        assert_eq!(key.value, expected);
    }

    #[rstest]
    #[case(PixKeyType::Cpf, "529.982.247-26")]
    #[case(PixKeyType::Cpf, "111.111.111-11")]
    #[case(PixKeyType::Cpf, "5299822472")]
    #[case(PixKeyType::Cnpj, "11.222.333/0001-82")]
    #[case(PixKeyType::Email, "sem-arroba.com")]
    #[case(PixKeyType::Email, "a@b")]
    #[case(PixKeyType::Telefone, "+1 202 555 0100")]
    #[case(PixKeyType::Telefone, "9999")]
    #[case(PixKeyType::Aleatoria, "not-a-uuid")]
    fn test_invalid_keys(#[case] key_type: PixKeyType, #[case] raw: &str) {
        assert!(matches!(
            PixKey::parse(key_type, raw),
            Err(PaymentError::InvalidPixKey { .. })
        ));
    }

    #[test]
    fn test_key_type_parse() {
        assert_eq!(PixKeyType::parse("cpf"), Some(PixKeyType::Cpf));
        assert_eq!(PixKeyType::parse("EVP"), Some(PixKeyType::Aleatoria));
        assert_eq!(PixKeyType::parse("boleto"), None);
    }
}
