// src/common/validators.rs

//! Validação e formatação de documentos brasileiros (CPF, CNPJ) e contatos.
//!
//! Todas as funções aceitam qualquer string: nunca entram em pânico e
//! nunca retornam erro para entrada malformada.

use validator::ValidationError;

// Pesos fixos dos dígitos verificadores do CNPJ
const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Unidades federativas aceitas no formulário de cadastro.
pub const BRAZILIAN_STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA",
    "MT", "MS", "MG", "PA", "PB", "PR", "PE", "PI", "RJ", "RN",
    "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Faixas de faturamento oferecidas no formulário.
pub const BILLING_RANGES: [&str; 6] = [
    "Até R$ 50.000",
    "R$ 50.000 - R$ 100.000",
    "R$ 100.000 - R$ 250.000",
    "R$ 250.000 - R$ 500.000",
    "R$ 500.000 - R$ 1.000.000",
    "Acima de R$ 1.000.000",
];

/// Remove tudo que não for dígito ASCII.
pub fn only_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn digit_values(input: &str) -> Vec<u32> {
    input.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

pub fn validate_cpf(input: &str) -> bool {
    let digits = digit_values(&only_digits(input));
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }

    // Pesos decrescentes: 10..2 para o primeiro dígito, 11..2 para o segundo
    let check = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        match (sum * 10) % 11 {
            10 | 11 => 0,
            r => r,
        }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

pub fn validate_cnpj(input: &str) -> bool {
    let digits = digit_values(&only_digits(input));
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }

    let check = |weights: &[u32]| {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        let remainder = sum % 11;
        if remainder < 2 { 0 } else { 11 - remainder }
    };

    check(&CNPJ_WEIGHTS_1) == digits[12] && check(&CNPJ_WEIGHTS_2) == digits[13]
}

/// Checagem estrutural simples: um único `@`, partes não vazias e um ponto
/// no domínio com texto dos dois lados. Não segue a RFC por completo.
pub fn validate_email(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = input.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || domain.is_empty() {
        return false;
    }

    domain
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len())
}

/// Telefone brasileiro: DDD + número, 10 (fixo) ou 11 (celular) dígitos.
pub fn validate_phone(input: &str) -> bool {
    (10..=11).contains(&only_digits(input).len())
}

// Aplica a máscara apenas se a quantidade de dígitos bate com o padrão;
// caso contrário devolve os dígitos como vieram.
fn apply_mask(digits: &str, groups: &[usize], separators: &[&str]) -> String {
    if digits.len() != groups.iter().sum::<usize>() {
        return digits.to_string();
    }

    let mut out = String::with_capacity(digits.len() + separators.iter().map(|s| s.len()).sum::<usize>());
    let mut start = 0;
    for (i, len) in groups.iter().enumerate() {
        out.push_str(separators[i]);
        out.push_str(&digits[start..start + len]);
        start += len;
    }
    out
}

/// `12345678909` -> `123.456.789-09`
pub fn format_cpf(input: &str) -> String {
    apply_mask(&only_digits(input), &[3, 3, 3, 2], &["", ".", ".", "-"])
}

/// `11222333000181` -> `11.222.333/0001-81`
pub fn format_cnpj(input: &str) -> String {
    apply_mask(&only_digits(input), &[2, 3, 3, 4, 2], &["", ".", ".", "/", "-"])
}

/// Celular (11 dígitos) `(11) 98765-4321`, fixo (10 dígitos) `(11) 3456-7890`.
pub fn format_phone(input: &str) -> String {
    let digits = only_digits(input);
    if digits.len() == 11 {
        apply_mask(&digits, &[2, 5, 4], &["(", ") ", "-"])
    } else {
        apply_mask(&digits, &[2, 4, 4], &["(", ") ", "-"])
    }
}

// ---
// Adaptadores para `#[validate(custom(...))]`
// ---

fn rule_error(code: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(code.into());
    err
}

pub fn cpf_rule(value: &str) -> Result<(), ValidationError> {
    if validate_cpf(value) { Ok(()) } else { Err(rule_error("invalid_cpf")) }
}

pub fn phone_rule(value: &str) -> Result<(), ValidationError> {
    if validate_phone(value) { Ok(()) } else { Err(rule_error("invalid_phone")) }
}
