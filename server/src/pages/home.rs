use super::{limit_label, make_path};
use common::{Consultation, Profile};
use leptos::either::Either;
use leptos::prelude::*;
use templates::{
    collapsible_block, html_escape, notice_html, Breadcrumb, InfoRow, NavLink, Notice, Page,
    Subpage,
};

pub struct HomeView<'a> {
    pub profile: &'a Profile,
    pub is_admin: bool,
    pub used_today: i32,
    pub history: &'a [Consultation],
    pub answer: Option<&'a str>,
    pub notice: Option<&'a Notice>,
}

fn question_form(action: &str) -> String {
    format!(
        r#"<form method="POST" action="{action}">
<label>Sua pergunta<br><textarea name="pergunta" placeholder="Ex.: Como lidar com objeções de preço?"></textarea></label>
<button type="submit">Enviar consulta</button>
</form>"#,
        action = html_escape(action),
    )
}

fn quota_status(limit: i32, used: i32) -> String {
    if limit == 0 {
        format!("{used} (Ilimitado)")
    } else {
        format!("{used} / {limit}")
    }
}

fn remaining_label(limit: i32, used: i32) -> String {
    match common::remaining(limit, used) {
        None => "Ilimitadas".to_string(),
        Some(0) => "Limite atingido".to_string(),
        Some(left) => left.to_string(),
    }
}

pub fn render(base: &str, home: HomeView<'_>) -> String {
    let limit = home.profile.effective_limit();
    let exhausted = !common::within_quota(limit, home.used_today);
    let history = home.history.to_vec();
    let empty = history.is_empty();

    let mut banner = notice_html(home.notice);
    if exhausted && home.notice.is_none() {
        banner = Notice::Error(
            "Você atingiu o limite diário de consultas. Tente novamente amanhã ou contate o administrador."
                .to_string(),
        )
        .to_html();
    }
    let form_html = question_form(&make_path(base, "/consultas"));
    let answer = home.answer.map(str::to_string);

    let content = view! {
        <div inner_html={banner}></div>
        <h2>"Nova Consulta"</h2>
        <div inner_html={form_html}></div>
        {match answer {
            Some(answer) => Either::Left(view! {
                <h2>"Resposta"</h2>
                <div class="answer">{answer}</div>
            }),
            None => Either::Right(()),
        }}
        <h2>"Histórico"</h2>
        {if empty {
            Either::Left(view! {
                <p>"Nenhuma consulta realizada ainda."</p>
            })
        } else {
            Either::Right(view! {
                <table class="data-table" data-export-name="historico">
                    <tr>
                        <th>"Data"</th>
                        <th>"Pergunta"</th>
                        <th>"Resposta"</th>
                    </tr>
                    {history.into_iter().map(|c| {
                        let when = c.created_at.format("%d/%m/%Y %H:%M").to_string();
                        let answer_html = collapsible_block(&c.answer, "answer");
                        view! {
                            <tr>
                                <td>{when}</td>
                                <td>{c.question}</td>
                                <td inner_html={answer_html}></td>
                            </tr>
                        }
                    }).collect::<Vec<_>>()}
                </table>
            })
        }}
    };

    let subpages = if home.is_admin {
        vec![
            Subpage::new(
                "Usuários",
                make_path(base, "/admin/users"),
                "Cadastro e limites diários",
            ),
            Subpage::new(
                "Relatórios",
                make_path(base, "/admin/reports"),
                "Consultas de hoje por usuário",
            ),
            Subpage::new(
                "Configurações",
                make_path(base, "/admin/config"),
                "URL, chave e timeout da API do mentor",
            ),
        ]
    } else {
        vec![]
    };

    Page {
        title: "Mentor de Vendas".to_string(),
        breadcrumbs: vec![Breadcrumb::current("Mentor de Vendas")],
        nav_links: vec![NavLink::new("Sair", make_path(base, "/logout"))],
        info_rows: vec![
            InfoRow::new("Usuário", &home.profile.name),
            InfoRow::new("Consultas hoje", &quota_status(limit, home.used_today)),
            InfoRow::new("Limite diário", &limit_label(home.profile.daily_limit)),
            InfoRow::new(
                "Consultas restantes",
                &remaining_label(limit, home.used_today),
            ),
        ],
        content,
        subpages,
    }
    .render()
}
