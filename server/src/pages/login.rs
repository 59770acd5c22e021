use super::make_path;
use leptos::prelude::*;
use templates::{html_escape, notice_html, Breadcrumb, Notice, Page};

pub fn render(base: &str, email: &str, notice: Option<&Notice>) -> String {
    let banner = notice_html(notice);
    let form_html = format!(
        r#"<form method="POST" action="{action}">
<label>E-mail <input type="email" name="email" value="{email}"></label>
<label>Senha <input type="password" name="senha"></label>
<button type="submit">Entrar</button>
</form>"#,
        action = html_escape(&make_path(base, "/login")),
        email = html_escape(email),
    );

    let content = view! {
        <div inner_html={banner}></div>
        <h2>"Entrar"</h2>
        <div inner_html={form_html}></div>
    };

    Page {
        title: "Mentor de Vendas - Entrar".to_string(),
        breadcrumbs: vec![Breadcrumb::current("Mentor de Vendas")],
        nav_links: vec![],
        info_rows: vec![],
        content,
        subpages: vec![],
    }
    .render()
}
