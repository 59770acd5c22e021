use super::make_path;
use common::ApiConfiguration;
use leptos::prelude::*;
use templates::{html_escape, notice_html, Breadcrumb, InfoRow, NavLink, Notice, Page};

/// Raw form values, kept as text so a rejected submission can be shown again.
#[derive(Debug, Clone)]
pub struct ConfigValues {
    pub base_url: String,
    pub auth_token: String,
    pub timeout_seconds: String,
}

impl Default for ConfigValues {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: String::new(),
            timeout_seconds: common::DEFAULT_TIMEOUT_SECONDS.to_string(),
        }
    }
}

impl From<&ApiConfiguration> for ConfigValues {
    fn from(config: &ApiConfiguration) -> Self {
        Self {
            base_url: config.base_url.clone(),
            auth_token: config.auth_token.clone().unwrap_or_default(),
            timeout_seconds: config.timeout_seconds.to_string(),
        }
    }
}

pub fn render(base: &str, values: &ConfigValues, saved: bool, notice: Option<&Notice>) -> String {
    let banner = notice_html(notice);
    let form_html = format!(
        r#"<form method="POST" action="{action}">
<label>URL Base da API <input type="url" name="url_base" value="{url}" placeholder="https://api.exemplo.com/mentor"></label>
<label>Chave de Autenticação (opcional) <input type="password" name="chave_autenticacao" value="{token}"></label>
<label>Timeout (segundos) <input type="number" min="{min}" max="{max}" name="timeout_segundos" value="{timeout}"></label>
<button type="submit">Salvar configurações</button>
</form>"#,
        action = html_escape(&make_path(base, "/admin/config")),
        url = html_escape(&values.base_url),
        token = html_escape(&values.auth_token),
        timeout = html_escape(&values.timeout_seconds),
        min = common::MIN_TIMEOUT_SECONDS,
        max = common::MAX_TIMEOUT_SECONDS,
    );
    let status = if saved { "Configurada" } else { "Não configurada" };

    let content = view! {
        <div inner_html={banner}></div>
        <h2>"Configurações da API Externa"</h2>
        <div inner_html={form_html}></div>
    };

    Page {
        title: "Mentor de Vendas - Configurações".to_string(),
        breadcrumbs: vec![
            Breadcrumb::link("Mentor de Vendas", make_path(base, "")),
            Breadcrumb::current("Configurações"),
        ],
        nav_links: vec![NavLink::back()],
        info_rows: vec![InfoRow::new("Status", status)],
        content,
        subpages: vec![],
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_unconfigured_uses_default_timeout() {
        let html = render("/", &ConfigValues::default(), false, None);
        assert!(html.contains("Não configurada"));
        assert!(html.contains(r#"name="timeout_segundos" value="30""#));
        assert!(html.contains(r#"action="/admin/config""#));
    }

    #[test]
    fn render_prefills_saved_configuration() {
        let config = ApiConfiguration {
            base_url: "https://mentor.example.com/hook".to_string(),
            auth_token: Some("Bearer abc".to_string()),
            timeout_seconds: 45,
        };
        let html = render("/", &ConfigValues::from(&config), true, None);
        assert!(html.contains("Configurada"));
        assert!(html.contains(r#"value="https://mentor.example.com/hook""#));
        assert!(html.contains(r#"value="Bearer abc""#));
        assert!(html.contains(r#"value="45""#));
    }

    #[test]
    fn render_shows_validation_error() {
        let values = ConfigValues {
            timeout_seconds: "500".to_string(),
            ..Default::default()
        };
        let notice = Notice::Error("Timeout deve estar entre 5 e 120 segundos".to_string());
        let html = render("/", &values, false, Some(&notice));
        assert!(html.contains("Timeout deve estar entre 5 e 120 segundos"));
        assert!(html.contains(r#"value="500""#));
    }
}
