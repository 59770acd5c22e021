use common::{ApiConfiguration, MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS};
use reqwest::Url;

pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn required_text(value: &str, field: &str) -> Result<String, String> {
    optional_text(value).ok_or_else(|| format!("{field} é obrigatório"))
}

pub fn daily_limit(value: &str) -> Result<i32, String> {
    match value.trim().parse::<i32>() {
        Ok(limit) if limit >= 0 => Ok(limit),
        _ => Err("Limite diário deve ser um número inteiro maior ou igual a zero".to_string()),
    }
}

pub fn api_configuration(
    base_url: &str,
    auth_token: &str,
    timeout_seconds: &str,
) -> Result<ApiConfiguration, String> {
    let base_url = base_url.trim();
    match Url::parse(base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => return Err("URL base da API inválida".to_string()),
    }

    let timeout_seconds = match timeout_seconds.trim().parse::<i32>() {
        Ok(t) if (MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&t) => t,
        _ => {
            return Err(format!(
                "Timeout deve estar entre {MIN_TIMEOUT_SECONDS} e {MAX_TIMEOUT_SECONDS} segundos"
            ))
        }
    };

    Ok(ApiConfiguration {
        base_url: base_url.to_string(),
        auth_token: optional_text(auth_token),
        timeout_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_limit_accepts_zero_and_positive() {
        assert_eq!(daily_limit("0"), Ok(0));
        assert_eq!(daily_limit(" 10 "), Ok(10));
        assert!(daily_limit("-1").is_err());
        assert!(daily_limit("cinco").is_err());
    }

    #[test]
    fn api_configuration_valid() {
        let cfg =
            api_configuration("https://mentor.example.com/webhook", " Bearer x ", "30").unwrap();
        assert_eq!(cfg.base_url, "https://mentor.example.com/webhook");
        assert_eq!(cfg.auth_token.as_deref(), Some("Bearer x"));
        assert_eq!(cfg.timeout_seconds, 30);
    }

    #[test]
    fn api_configuration_blank_token_is_none() {
        let cfg = api_configuration("http://localhost:9000", "   ", "5").unwrap();
        assert_eq!(cfg.auth_token, None);
    }

    #[test]
    fn api_configuration_timeout_bounds() {
        assert!(api_configuration("http://a.example", "", "4").is_err());
        assert!(api_configuration("http://a.example", "", "5").is_ok());
        assert!(api_configuration("http://a.example", "", "120").is_ok());
        assert!(api_configuration("http://a.example", "", "121").is_err());
        assert!(api_configuration("http://a.example", "", "abc").is_err());
    }

    #[test]
    fn api_configuration_rejects_non_http_urls() {
        assert!(api_configuration("not a url", "", "30").is_err());
        assert!(api_configuration("ftp://files.example.com", "", "30").is_err());
        assert!(api_configuration("", "", "30").is_err());
    }

    #[test]
    fn required_text_names_the_field() {
        assert_eq!(required_text("  ", "Nome"), Err("Nome é obrigatório".to_string()));
        assert_eq!(required_text(" Ana ", "Nome"), Ok("Ana".to_string()));
    }
}
