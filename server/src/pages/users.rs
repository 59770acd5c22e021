use super::{limit_label, make_path};
use common::Profile;
use leptos::either::Either;
use leptos::prelude::*;
use templates::{html_escape, notice_html, Breadcrumb, InfoRow, NavLink, Notice, Page};

/// Values echoed back into the create form after a failed submission.
#[derive(Debug, Default, Clone)]
pub struct NewUserValues {
    pub name: String,
    pub email: String,
    pub username: String,
    pub phone: String,
    pub daily_limit: String,
}

fn create_form(action: &str, values: &NewUserValues) -> String {
    let limit = if values.daily_limit.is_empty() {
        common::DEFAULT_DAILY_LIMIT.to_string()
    } else {
        values.daily_limit.clone()
    };
    format!(
        r#"<form method="POST" action="{action}">
<label>Nome <input type="text" name="nome" value="{name}"></label>
<label>E-mail <input type="email" name="email" value="{email}"></label>
<label>Usuário <input type="text" name="usuario" value="{username}"></label>
<label>Senha <input type="password" name="senha"></label>
<label>Telefone <input type="text" name="telefone" value="{phone}"></label>
<label>Limite diário (0 = ilimitado) <input type="number" min="0" name="limite_diario" value="{limit}"></label>
<button type="submit">Criar usuário</button>
</form>"#,
        action = html_escape(action),
        name = html_escape(&values.name),
        email = html_escape(&values.email),
        username = html_escape(&values.username),
        phone = html_escape(&values.phone),
        limit = html_escape(&limit),
    )
}

fn edit_form(action: &str, profile: &Profile) -> String {
    let limit = profile.effective_limit().to_string();
    format!(
        r#"<form method="POST" action="{action}">
<label>Nome <input type="text" name="nome" value="{name}"></label>
<label>Telefone <input type="text" name="telefone" value="{phone}"></label>
<label>Limite diário (0 = ilimitado) <input type="number" min="0" name="limite_diario" value="{limit}"></label>
<button type="submit">Salvar</button>
</form>"#,
        action = html_escape(action),
        name = html_escape(&profile.name),
        phone = html_escape(profile.phone.as_deref().unwrap_or("")),
        limit = html_escape(&limit),
    )
}

pub fn render_index(
    base: &str,
    profiles: &[Profile],
    values: &NewUserValues,
    notice: Option<&Notice>,
) -> String {
    let profiles = profiles.to_vec();
    let empty = profiles.is_empty();
    let count = profiles.len();
    let base_owned = base.to_string();
    let banner = notice_html(notice);
    let form_html = create_form(&make_path(base, "/admin/users"), values);

    let content = view! {
        <div inner_html={banner}></div>
        <h2>"Usuários"</h2>
        {if empty {
            Either::Left(view! {
                <p>"Nenhum usuário cadastrado."</p>
            })
        } else {
            Either::Right(view! {
                <table class="data-table" data-export-name="usuarios">
                    <tr>
                        <th>"Nome"</th>
                        <th>"Usuário"</th>
                        <th>"E-mail"</th>
                        <th>"Telefone"</th>
                        <th>"Limite diário"</th>
                    </tr>
                    {profiles.into_iter().map(|p| {
                        let href = make_path(&base_owned, &format!("/admin/users/{}", p.id));
                        let limit = limit_label(p.daily_limit);
                        let phone = p.phone.unwrap_or_else(|| "-".to_string());
                        view! {
                            <tr>
                                <td><a href={href}>{p.name}</a></td>
                                <td>{p.username}</td>
                                <td>{p.email}</td>
                                <td>{phone}</td>
                                <td>{limit}</td>
                            </tr>
                        }
                    }).collect::<Vec<_>>()}
                </table>
            })
        }}
        <h2>"Novo Usuário"</h2>
        <div inner_html={form_html}></div>
    };

    Page {
        title: "Mentor de Vendas - Usuários".to_string(),
        breadcrumbs: vec![
            Breadcrumb::link("Mentor de Vendas", make_path(base, "")),
            Breadcrumb::current("Usuários"),
        ],
        nav_links: vec![NavLink::back()],
        info_rows: vec![InfoRow::new("Total de usuários", &count.to_string())],
        content,
        subpages: vec![],
    }
    .render()
}

pub fn render_edit(base: &str, profile: &Profile, notice: Option<&Notice>) -> String {
    let banner = notice_html(notice);
    let form_html = edit_form(
        &make_path(base, &format!("/admin/users/{}", profile.id)),
        profile,
    );

    let content = view! {
        <div inner_html={banner}></div>
        <h2>"Editar Usuário"</h2>
        <div inner_html={form_html}></div>
    };

    Page {
        title: format!("Mentor de Vendas - {}", profile.name),
        breadcrumbs: vec![
            Breadcrumb::link("Mentor de Vendas", make_path(base, "")),
            Breadcrumb::link("Usuários", make_path(base, "/admin/users")),
            Breadcrumb::current(&profile.name),
        ],
        nav_links: vec![NavLink::back()],
        info_rows: vec![
            InfoRow::new("ID", &profile.id.to_string()),
            InfoRow::new("Usuário", &profile.username),
            InfoRow::new("E-mail", &profile.email),
        ],
        content,
        subpages: vec![],
    }
    .render()
}
